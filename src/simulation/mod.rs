pub mod assignment;
pub mod messages;
pub mod movement;
pub mod positions;
pub mod schedule;
pub mod sequencer;

use crate::assets::{AssetHandles, LoadingState};
use crate::clock::DepotClock;
use crate::depot::{Depot, PlanBook};
use crate::fleet::{Fleet, TrainsetUpdate};
use crate::simulation::assignment::TrackAssignment;
use crate::simulation::messages::{MessagingPlugin, PlanCommand, ShuntingStep};
use crate::simulation::movement::ShuntingPlan;
use crate::simulation::positions::PositionStore;
use crate::simulation::sequencer::{MovementSequencer, StepOutcome};
use bevy::prelude::*;

/// The board state: the sequencer with its position table, and the plan it is playing.
#[derive(Resource)]
pub struct Shunting {
    pub sequencer: MovementSequencer,
    pub plan_name: Option<String>,
    pub plan_summary: String,
}

/// Plans available to the operator, in file order.
#[derive(Resource, Default, Deref)]
pub struct Plans(pub Vec<ShuntingPlan>);

/// Fired after the fleet or layout was (re)built from the depot file.
#[derive(Event)]
pub struct BoardRebuilt;

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MessagingPlugin)
            .init_resource::<Plans>()
            .add_systems(OnEnter(LoadingState::Loaded), init)
            .add_systems(
                Update,
                (reload_depot, apply_trainset_updates, handle_plan_commands, advance_plan)
                    .chain()
                    .run_if(in_state(LoadingState::Loaded)),
            );
    }
}

fn initial_positions(fleet: &Fleet, depot: &Depot) -> PositionStore {
    let assignment = TrackAssignment::resolve(fleet.ids(), depot.layout.track_count);
    if fleet.len() > depot.layout.track_count as usize {
        warn!(
            "{} trainsets do not fit on {} tracks, some will share a track",
            fleet.len(),
            depot.layout.track_count
        );
    }
    PositionStore::from_assignment(&assignment, &depot.layout)
}

fn init(
    handles: Res<AssetHandles>,
    depots: Res<Assets<Depot>>,
    plan_books: Res<Assets<PlanBook>>,
    mut exit: MessageWriter<AppExit>,
    mut commands: Commands,
) {
    let Some(depot) = depots.get(&handles.depot) else {
        error!("Depot file could not be loaded, nothing to show");
        exit.write(AppExit::error());
        return;
    };

    let fleet = Fleet::new(depot.trainsets.iter().cloned());
    let sequencer = MovementSequencer::new(initial_positions(&fleet, depot), depot.layout.clone(), depot.timing);
    info!(
        "Depot {} ready: {} trainsets on {} tracks",
        depot.name,
        fleet.len(),
        depot.layout.track_count
    );

    let plans = match plan_books.get(&handles.plans) {
        Some(book) => book.plans.clone(),
        None => {
            warn!("Shunting plans could not be loaded, starting without plans");
            Vec::new()
        }
    };
    info!("{} shunting plans available", plans.len());

    commands.insert_resource(fleet);
    commands.insert_resource(Plans(plans));
    commands.insert_resource(Shunting {
        sequencer,
        plan_name: None,
        plan_summary: String::new(),
    });
    commands.trigger(BoardRebuilt);
}

fn reload_depot(
    mut events: MessageReader<AssetEvent<Depot>>,
    handles: Res<AssetHandles>,
    depots: Res<Assets<Depot>>,
    mut fleet: ResMut<Fleet>,
    mut shunting: ResMut<Shunting>,
    mut commands: Commands,
) {
    let modified = events.read().any(|event| event.is_modified(handles.depot.id()));
    if !modified {
        return;
    }
    let Some(depot) = depots.get(&handles.depot) else {
        return;
    };

    *fleet = Fleet::new(depot.trainsets.iter().cloned());
    let initial = initial_positions(&fleet, depot);
    let sequencer = &mut shunting.sequencer;
    sequencer.set_layout(depot.layout.clone());
    sequencer.set_timing(depot.timing);
    sequencer.rebase(initial);
    info!("Depot {} reloaded: {} trainsets", depot.name, fleet.len());
    commands.trigger(BoardRebuilt);
}

fn apply_trainset_updates(mut updates: MessageReader<TrainsetUpdate>, mut fleet: ResMut<Fleet>) {
    for update in updates.read() {
        match fleet.apply(update) {
            Ok(trainset) => info!(
                "Trainset {} updated: {}, job card {}",
                trainset.id, trainset.status, trainset.job_card_status
            ),
            Err(err) => warn!("Ignoring trainset update: {}", err),
        }
    }
}

fn handle_plan_commands(mut plan_commands: MessageReader<PlanCommand>, mut shunting: ResMut<Shunting>) {
    for command in plan_commands.read() {
        match command {
            PlanCommand::Run(plan) => {
                info!("Running plan '{}' ({} movements)", plan.name, plan.movements.len());
                shunting.sequencer.apply(plan.movements.clone());
                shunting.plan_name = Some(plan.name.clone());
                shunting.plan_summary = plan.summary.clone();
            }
            PlanCommand::Replay => {
                let movements = shunting.sequencer.plan().to_vec();
                info!("Replaying {} movements", movements.len());
                shunting.sequencer.apply(movements);
            }
            PlanCommand::Clear => {
                info!("Clearing shunting plan");
                shunting.sequencer.apply(Vec::new());
                shunting.plan_name = None;
                shunting.plan_summary.clear();
            }
        }
    }
}

fn advance_plan(
    time: Res<Time>,
    clock: Res<DepotClock>,
    mut shunting: ResMut<Shunting>,
    mut steps: MessageWriter<ShuntingStep>,
) {
    let reports = shunting.bypass_change_detection().sequencer.tick(time.delta());
    if reports.is_empty() {
        return;
    }
    shunting.set_changed();

    let at = clock.current();
    for report in reports {
        let movement = &report.movement;
        match &report.outcome {
            StepOutcome::Moved(_) => {
                info!(
                    "Step {}/{}: {} track {} -> {} ({})",
                    report.index + 1,
                    report.total,
                    movement.train_id,
                    movement.from_track,
                    movement.to_track,
                    movement.reason
                );
            }
            StepOutcome::UnknownTrain => {
                warn!(
                    "Step {}/{}: trainset {} is not in the depot, skipped",
                    report.index + 1,
                    report.total,
                    movement.train_id
                );
            }
        }
        steps.write(ShuntingStep { report, at });
    }
}
