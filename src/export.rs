use crate::common::{TrackNo, TrainId};
use crate::depot::DepotLayout;
use crate::fleet::{Fleet, JobCardStatus, OperationalStatus, SlaPriority};
use crate::simulation::positions::PositionStore;
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const PLANNER_REQUEST_PATH: &str = "planner-request.toml";
pub const INDUCTION_PLAN_PATH: &str = "induction-plan.toml";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not serialize export: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize, Debug, PartialEq)]
pub struct PlannerTrainState {
    pub id: TrainId,
    pub track: Option<TrackNo>,
    pub status: OperationalStatus,
    pub destination: String,
}

/// Depot state handed to the external shunting planner. Its answer comes back as a plan in the plans file.
#[derive(Serialize, Debug)]
pub struct PlannerRequest {
    pub depot_layout: String,
    pub trains: Vec<PlannerTrainState>,
}

impl PlannerRequest {
    pub fn new(fleet: &Fleet, positions: &PositionStore, layout: &DepotLayout) -> Self {
        let trains = fleet
            .iter()
            .map(|trainset| PlannerTrainState {
                id: trainset.id.clone(),
                track: positions.track_of(&trainset.id, layout),
                status: trainset.status,
                destination: trainset.status.destination().to_string(),
            })
            .collect();
        PlannerRequest {
            depot_layout: format!("{} ({} tracks)", layout.description, layout.track_count),
            trains,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct InductionEntry {
    pub id: TrainId,
    pub status: OperationalStatus,
    pub job_card_status: JobCardStatus,
    pub sla_priority: SlaPriority,
    pub mileage: u64,
}

/// The day's induction plan: every trainset with its assignment, plus the service coverage it yields.
#[derive(Serialize, Debug)]
pub struct InductionPlan {
    pub generated_at: String,
    pub sla_coverage: f64,
    pub trainsets: Vec<InductionEntry>,
}

impl InductionPlan {
    pub fn new(fleet: &Fleet, generated_at: String) -> Self {
        let trainsets = fleet
            .iter()
            .map(|t| InductionEntry {
                id: t.id.clone(),
                status: t.status,
                job_card_status: t.job_card_status,
                sla_priority: t.sla_priority,
                mileage: t.mileage,
            })
            .collect();
        InductionPlan {
            generated_at,
            sla_coverage: fleet.sla_coverage(),
            trainsets,
        }
    }
}

pub fn write_toml<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<(), ExportError> {
    let contents = toml::to_string_pretty(value)?;
    fs::write(path, contents)?;
    Ok(())
}
