use crate::common::TrainId;
use bevy::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    Service,
    Standby,
    Maintenance,
    Cleaning,
}

impl OperationalStatus {
    pub const ALL: [OperationalStatus; 4] = [
        OperationalStatus::Service,
        OperationalStatus::Standby,
        OperationalStatus::Maintenance,
        OperationalStatus::Cleaning,
    ];

    /// Where the planner is asked to take a train in this state.
    pub fn destination(&self) -> &'static str {
        match self {
            OperationalStatus::Service => "Exit",
            OperationalStatus::Standby => "Stabling",
            OperationalStatus::Maintenance => "Maintenance Bay",
            OperationalStatus::Cleaning => "Cleaning Bay",
        }
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationalStatus::Service => "service",
            OperationalStatus::Standby => "standby",
            OperationalStatus::Maintenance => "maintenance",
            OperationalStatus::Cleaning => "cleaning",
        };
        f.write_str(label)
    }
}

#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FitnessStatus {
    Fit,
    #[serde(rename = "Needs Check")]
    NeedsCheck,
    Unfit,
}

impl fmt::Display for FitnessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessStatus::Fit => f.write_str("Fit"),
            FitnessStatus::NeedsCheck => f.write_str("Needs Check"),
            FitnessStatus::Unfit => f.write_str("Unfit"),
        }
    }
}

#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobCardStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl fmt::Display for JobCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobCardStatus::Open => f.write_str("Open"),
            JobCardStatus::InProgress => f.write_str("In Progress"),
            JobCardStatus::Closed => f.write_str("Closed"),
        }
    }
}

#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlaPriority {
    High,
    Medium,
    Low,
}

impl fmt::Display for SlaPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Trainset {
    pub id: TrainId,
    pub status: OperationalStatus,
    pub fitness_status: FitnessStatus,
    pub job_card_status: JobCardStatus,
    pub mileage: u64,
    pub sla_priority: SlaPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_notes: Option<String>,
}

/// Findings an operator can log against a trainset from the board.
pub const MAINTENANCE_FINDINGS: [&str; 4] = [
    "Brake pad wear above limit",
    "HVAC fault reported by crew",
    "Pantograph inspection due",
    "Interior deep clean required",
];

/// Partial update of a trainset record; `None` fields are left untouched.
#[derive(Message, Clone, Debug, Default)]
pub struct TrainsetUpdate {
    pub id: TrainId,
    pub status: Option<OperationalStatus>,
    pub job_card_status: Option<JobCardStatus>,
    pub maintenance_notes: Option<String>,
}

impl TrainsetUpdate {
    pub fn status(id: impl Into<TrainId>, status: OperationalStatus) -> Self {
        TrainsetUpdate {
            id: id.into(),
            status: Some(status),
            ..default()
        }
    }

    pub fn job_card(id: impl Into<TrainId>, job_card_status: JobCardStatus) -> Self {
        TrainsetUpdate {
            id: id.into(),
            job_card_status: Some(job_card_status),
            ..default()
        }
    }

    /// Job card and notes together, as saved from a maintenance log entry. Empty notes clear the log.
    pub fn maintenance_log(id: impl Into<TrainId>, job_card_status: JobCardStatus, notes: impl Into<String>) -> Self {
        TrainsetUpdate {
            id: id.into(),
            job_card_status: Some(job_card_status),
            maintenance_notes: Some(notes.into()),
            ..default()
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FleetError {
    #[error("unknown trainset {0}")]
    UnknownTrainset(TrainId),
}

#[derive(Resource, Default, Debug)]
pub struct Fleet {
    trainsets: Vec<Trainset>,
}

impl Fleet {
    pub fn new(trainsets: impl IntoIterator<Item = Trainset>) -> Self {
        let mut fleet = Fleet::default();
        for trainset in trainsets {
            match fleet.trainsets.iter_mut().find(|t| t.id == trainset.id) {
                Some(existing) => {
                    warn!("Duplicate trainset {} in fleet data, keeping the last record", trainset.id);
                    *existing = trainset;
                }
                None => fleet.trainsets.push(trainset),
            }
        }
        fleet
    }

    pub fn get(&self, id: &str) -> Option<&Trainset> {
        self.trainsets.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trainset> {
        self.trainsets.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.trainsets.iter().map(|t| t.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.trainsets.len()
    }

    pub fn apply(&mut self, update: &TrainsetUpdate) -> Result<&Trainset, FleetError> {
        let trainset = self
            .trainsets
            .iter_mut()
            .find(|t| t.id == update.id)
            .ok_or_else(|| FleetError::UnknownTrainset(update.id.clone()))?;

        if let Some(status) = update.status {
            trainset.status = status;
        }
        if let Some(job_card_status) = update.job_card_status {
            trainset.job_card_status = job_card_status;
        }
        if let Some(notes) = &update.maintenance_notes {
            trainset.maintenance_notes = if notes.is_empty() { None } else { Some(notes.clone()) };
        }
        Ok(trainset)
    }

    pub fn count_with_status(&self, status: OperationalStatus) -> usize {
        self.trainsets.iter().filter(|t| t.status == status).count()
    }

    /// Share of the fleet in service, in percent.
    pub fn sla_coverage(&self) -> f64 {
        if self.trainsets.is_empty() {
            return 0.0;
        }
        self.count_with_status(OperationalStatus::Service) as f64 / self.trainsets.len() as f64 * 100.0
    }

    /// Highest-mileage trainsets outside maintenance, used to balance wear across the fleet.
    pub fn mileage_leaders(&self, count: usize) -> Vec<&Trainset> {
        self.trainsets
            .iter()
            .filter(|t| t.status != OperationalStatus::Maintenance)
            .sorted_by(|a, b| b.mileage.cmp(&a.mileage))
            .take(count)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn trainset(id: &str, status: OperationalStatus, mileage: u64) -> Trainset {
        Trainset {
            id: id.to_string(),
            status,
            fitness_status: FitnessStatus::Fit,
            job_card_status: JobCardStatus::Closed,
            mileage,
            sla_priority: SlaPriority::Medium,
            maintenance_notes: None,
        }
    }

    pub(crate) fn seed_fleet() -> Fleet {
        use OperationalStatus::*;
        Fleet::new([
            trainset("T-801", Service, 120_500),
            trainset("T-802", Service, 95_200),
            trainset("T-803", Standby, 500),
            trainset("T-804", Maintenance, 210_300),
            trainset("T-805", Service, 150_000),
            trainset("T-806", Cleaning, 75_600),
            trainset("T-807", Standby, 1_200),
            trainset("T-808", Maintenance, 300_100),
            trainset("T-809", Service, 88_000),
            trainset("T-810", Service, 45_000),
        ])
    }

    #[test]
    fn test_sla_coverage() {
        let fleet = seed_fleet();
        assert_eq!(fleet.count_with_status(OperationalStatus::Service), 5);
        assert_eq!(fleet.sla_coverage(), 50.0);
        assert_eq!(Fleet::default().sla_coverage(), 0.0);
    }

    #[test]
    fn test_mileage_leaders() {
        let fleet = seed_fleet();
        let leaders: Vec<&str> = fleet.mileage_leaders(5).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(leaders, ["T-805", "T-801", "T-802", "T-809", "T-806"]);
        assert_eq!(fleet.mileage_leaders(100).len(), 8);
    }

    #[test]
    fn test_apply_update() {
        let mut fleet = seed_fleet();
        let updated = fleet
            .apply(&TrainsetUpdate::status("T-803", OperationalStatus::Service))
            .unwrap();
        assert_eq!(updated.status, OperationalStatus::Service);
        assert_eq!(updated.job_card_status, JobCardStatus::Closed);

        let notes = TrainsetUpdate {
            id: "T-804".into(),
            job_card_status: Some(JobCardStatus::InProgress),
            maintenance_notes: Some("Pantograph replaced".into()),
            ..default()
        };
        fleet.apply(&notes).unwrap();
        let t804 = fleet.get("T-804").unwrap();
        assert_eq!(t804.job_card_status, JobCardStatus::InProgress);
        assert_eq!(t804.status, OperationalStatus::Maintenance);
        assert_eq!(t804.maintenance_notes.as_deref(), Some("Pantograph replaced"));

        let cleared = TrainsetUpdate {
            id: "T-804".into(),
            maintenance_notes: Some(String::new()),
            ..default()
        };
        fleet.apply(&cleared).unwrap();
        assert_eq!(fleet.get("T-804").unwrap().maintenance_notes, None);
    }

    #[test]
    fn test_maintenance_log() {
        let mut fleet = seed_fleet();
        let logged = fleet
            .apply(&TrainsetUpdate::maintenance_log("T-802", JobCardStatus::Open, MAINTENANCE_FINDINGS[1]))
            .unwrap();
        assert_eq!(logged.job_card_status, JobCardStatus::Open);
        assert_eq!(logged.maintenance_notes.as_deref(), Some("HVAC fault reported by crew"));
        assert_eq!(logged.status, OperationalStatus::Service);

        let closed = fleet
            .apply(&TrainsetUpdate::maintenance_log("T-802", JobCardStatus::Closed, ""))
            .unwrap();
        assert_eq!(closed.job_card_status, JobCardStatus::Closed);
        assert_eq!(closed.maintenance_notes, None);
    }

    #[test]
    fn test_apply_unknown() {
        let mut fleet = seed_fleet();
        let result = fleet.apply(&TrainsetUpdate::job_card("T-999", JobCardStatus::Open));
        assert_eq!(result, Err(FleetError::UnknownTrainset("T-999".into())));
        assert_eq!(fleet.len(), 10);
    }

    #[test]
    fn test_duplicates_keep_last() {
        let fleet = Fleet::new([
            trainset("T-801", OperationalStatus::Service, 1),
            trainset("T-802", OperationalStatus::Standby, 2),
            trainset("T-801", OperationalStatus::Cleaning, 3),
        ]);
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.get("T-801").unwrap().status, OperationalStatus::Cleaning);
        assert_eq!(fleet.ids().collect::<Vec<_>>(), ["T-801", "T-802"]);
    }

    #[test]
    fn test_destinations() {
        let destinations: Vec<&str> = OperationalStatus::ALL.iter().map(|s| s.destination()).collect();
        assert_eq!(destinations, ["Exit", "Stabling", "Maintenance Bay", "Cleaning Bay"]);
    }
}
