use crate::fleet::TrainsetUpdate;
use crate::simulation::movement::ShuntingPlan;
use crate::simulation::sequencer::StepReport;
use bevy::prelude::*;
use chrono::NaiveDateTime;

/// A step of the running plan came due.
#[derive(Message, Clone, Debug)]
pub struct ShuntingStep {
    pub report: StepReport,
    pub at: NaiveDateTime,
}

#[derive(Message, Clone, Debug)]
pub enum PlanCommand {
    /// Rewinds the board and plays the given plan.
    Run(ShuntingPlan),
    /// Rewinds the board and plays the current plan again.
    Replay,
    /// Rewinds the board and drops the current plan.
    Clear,
}

pub struct MessagingPlugin;

impl Plugin for MessagingPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ShuntingStep>()
            .add_message::<PlanCommand>()
            .add_message::<TrainsetUpdate>();
    }
}
