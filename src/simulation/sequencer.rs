use crate::depot::{DepotLayout, StepTiming};
use crate::simulation::movement::Movement;
use crate::simulation::positions::PositionStore;
use crate::simulation::schedule::Schedule;
use bevy::log::debug;
use bevy::math::Vec2;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Moved(Vec2),
    UnknownTrain,
}

/// Record of a movement step that came due.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub index: usize,
    pub total: usize,
    pub movement: Movement,
    pub outcome: StepOutcome,
}

struct ScheduledStep {
    index: usize,
    movement: Movement,
}

/// Replays shunting movements against the depot board.
///
/// The sequencer owns the position table. Every call to [`apply`](Self::apply) rewinds the table to the initial
/// positions and replaces the pending steps, so a plan that is still running can never write into the next one.
pub struct MovementSequencer {
    layout: DepotLayout,
    timing: StepTiming,
    initial: PositionStore,
    positions: PositionStore,
    plan: Vec<Movement>,
    schedule: Schedule<ScheduledStep>,
    fired: usize,
}

impl MovementSequencer {
    pub fn new(initial: PositionStore, layout: DepotLayout, timing: StepTiming) -> Self {
        MovementSequencer {
            layout,
            timing,
            positions: initial.clone(),
            initial,
            plan: Vec::new(),
            schedule: Schedule::new(),
            fired: 0,
        }
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn layout(&self) -> &DepotLayout {
        &self.layout
    }

    pub fn plan(&self) -> &[Movement] {
        &self.plan
    }

    pub fn is_running(&self) -> bool {
        !self.schedule.is_idle()
    }

    /// Steps fired so far and the length of the current plan.
    pub fn progress(&self) -> (usize, usize) {
        (self.fired, self.plan.len())
    }

    /// Starts a new plan from the initial positions, discarding whatever was still pending from the previous one.
    pub fn apply(&mut self, movements: Vec<Movement>) {
        self.cancel();
        self.positions.reset_to(&self.initial);
        self.plan = movements;
        self.fired = 0;
        self.schedule = Schedule::new();
        for (index, movement) in self.plan.iter().enumerate() {
            self.schedule.push_after(
                self.timing.due(index),
                ScheduledStep {
                    index,
                    movement: movement.clone(),
                },
            );
        }
        debug!("Scheduled {} shunting movements", self.plan.len());
    }

    /// Replaces the initial positions after the set of trains changed and restarts the current plan from them.
    pub fn rebase(&mut self, initial: PositionStore) {
        self.initial = initial;
        let plan = std::mem::take(&mut self.plan);
        self.apply(plan);
    }

    /// Stops the running plan where it is. Returns the number of steps that will no longer fire.
    pub fn cancel(&mut self) -> usize {
        let cancelled = self.schedule.cancel();
        if cancelled > 0 {
            debug!("Cancelled {} pending shunting movements", cancelled);
        }
        cancelled
    }

    /// Steps that fire after this call use the new track coordinates; the initial positions are replaced by
    /// [`rebase`](Self::rebase).
    pub fn set_layout(&mut self, layout: DepotLayout) {
        self.layout = layout;
    }

    /// Takes effect from the next [`apply`](Self::apply).
    pub fn set_timing(&mut self, timing: StepTiming) {
        self.timing = timing;
    }

    /// Advances the plan by `dt` and applies every step that came due, in plan order.
    pub fn tick(&mut self, dt: Duration) -> Vec<StepReport> {
        let total = self.plan.len();
        let due = self.schedule.tick(dt);
        let mut reports = Vec::with_capacity(due.len());
        for step in due {
            let y = self.layout.track_y(step.movement.to_track);
            let outcome = match self.positions.set_y(&step.movement.train_id, y) {
                Some(position) => StepOutcome::Moved(position),
                None => {
                    debug!("Skipping movement of unknown train {}", step.movement.train_id);
                    StepOutcome::UnknownTrain
                }
            };
            self.fired = step.index + 1;
            reports.push(StepReport {
                index: step.index,
                total,
                movement: step.movement,
                outcome,
            });
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::assignment::TrackAssignment;

    const SECOND: Duration = Duration::from_secs(1);

    fn for_trains<const N: usize>(train_ids: [&str; N], layout: DepotLayout, timing: StepTiming) -> MovementSequencer {
        let assignment = TrackAssignment::resolve(train_ids, layout.track_count);
        let initial = PositionStore::from_assignment(&assignment, &layout);
        MovementSequencer::new(initial, layout, timing)
    }

    fn movement(train_id: &str, from_track: u32, to_track: u32, reason: &str) -> Movement {
        Movement {
            train_id: train_id.to_string(),
            from_track,
            to_track,
            reason: reason.to_string(),
        }
    }

    fn sequencer() -> MovementSequencer {
        let ids = ["T-801", "T-802", "T-803", "T-804"];
        for_trains(ids, DepotLayout::default(), StepTiming::default())
    }

    fn run_to_end(sequencer: &mut MovementSequencer) {
        sequencer.tick(Duration::from_secs(3600));
        assert!(!sequencer.is_running());
    }

    fn y_of(sequencer: &MovementSequencer, train_id: &str) -> f32 {
        sequencer.positions().get(train_id).unwrap().y
    }

    #[test]
    fn test_empty_plan_resets() {
        let mut sequencer = sequencer();
        sequencer.apply(vec![movement("T-801", 3, 1, "")]);
        run_to_end(&mut sequencer);
        assert_ne!(sequencer.positions(), &sequencer.initial);

        sequencer.apply(Vec::new());
        assert_eq!(sequencer.positions(), &sequencer.initial);
        assert!(!sequencer.is_running());
        assert!(sequencer.tick(SECOND).is_empty());
    }

    #[test]
    fn test_steps_apply_one_at_a_time() {
        let layout = DepotLayout::default();
        let mut sequencer = sequencer();
        let initial = sequencer.initial.clone();
        sequencer.apply(vec![
            movement("T-801", 1, 3, "Clear the exit road"),
            movement("T-802", 2, 5, "Move to cleaning bay"),
        ]);
        // applying rewinds immediately, nothing moves before the first delay
        assert_eq!(sequencer.positions(), &initial);
        assert!(sequencer.tick(SECOND - Duration::from_millis(1)).is_empty());

        let reports = sequencer.tick(Duration::from_millis(1));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].index, 0);
        assert_eq!(y_of(&sequencer, "T-801"), layout.track_y(3));
        assert_eq!(sequencer.positions().get("T-802"), initial.get("T-802"));
        assert_eq!(sequencer.positions().get("T-801").unwrap().x, initial.get("T-801").unwrap().x);
        assert_eq!(sequencer.progress(), (1, 2));

        let reports = sequencer.tick(SECOND);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, StepOutcome::Moved(Vec2::new(layout.lane_x, layout.track_y(5))));
        assert_eq!(y_of(&sequencer, "T-802"), layout.track_y(5));
        assert_eq!(sequencer.progress(), (2, 2));
        assert!(!sequencer.is_running());
    }

    #[test]
    fn test_offset_timing() {
        let layout = DepotLayout::default();
        let timing = StepTiming {
            initial_delay_ms: 500,
            step_delay_ms: 1500,
        };
        let mut sequencer = for_trains(["T-801", "T-802"], layout.clone(), timing);
        sequencer.apply(vec![movement("T-801", 3, 1, ""), movement("T-802", 4, 2, "")]);

        assert_eq!(sequencer.tick(Duration::from_millis(500)).len(), 1);
        assert_eq!(y_of(&sequencer, "T-801"), layout.track_y(1));
        assert!(sequencer.tick(Duration::from_millis(1499)).is_empty());
        assert_eq!(sequencer.tick(Duration::from_millis(1)).len(), 1);
        assert_eq!(y_of(&sequencer, "T-802"), layout.track_y(2));
    }

    #[test]
    fn test_new_plan_replaces_running_plan() {
        let plan_a = vec![
            movement("T-801", 3, 1, ""),
            movement("T-802", 4, 2, ""),
            movement("T-803", 5, 6, ""),
        ];
        let plan_b = vec![movement("T-804", 6, 5, ""), movement("T-802", 4, 1, "")];

        let mut expected = sequencer();
        expected.apply(plan_b.clone());
        run_to_end(&mut expected);

        let mut sequencer = sequencer();
        sequencer.apply(plan_a);
        sequencer.tick(SECOND);
        sequencer.tick(Duration::from_millis(500));
        assert_eq!(sequencer.progress(), (1, 3));

        sequencer.apply(plan_b);
        assert_eq!(sequencer.positions(), &sequencer.initial);
        // the remaining steps of the first plan would have fired by now
        let reports = sequencer.tick(Duration::from_secs(2));
        assert!(reports.iter().all(|r| r.movement.train_id != "T-803"));
        assert_eq!(reports.len(), 2);
        run_to_end(&mut sequencer);
        assert_eq!(sequencer.positions(), expected.positions());
    }

    #[test]
    fn test_unknown_train_is_skipped() {
        let mut sequencer = sequencer();
        sequencer.apply(vec![movement("T-999", 1, 2, ""), movement("T-801", 3, 6, "")]);

        let reports = sequencer.tick(SECOND);
        assert_eq!(reports[0].outcome, StepOutcome::UnknownTrain);
        assert_eq!(sequencer.positions(), &sequencer.initial);
        assert!(!sequencer.positions().contains("T-999"));

        // the skipped step still occupies its slot
        assert!(sequencer.tick(SECOND - Duration::from_millis(1)).is_empty());
        assert_eq!(sequencer.tick(Duration::from_millis(1)).len(), 1);
        assert_eq!(y_of(&sequencer, "T-801"), DepotLayout::default().track_y(6));
    }

    #[test]
    fn test_same_train_moves_in_order() {
        let mut sequencer = sequencer();
        sequencer.apply(vec![movement("T-801", 3, 1, ""), movement("T-801", 1, 6, "")]);
        let reports = sequencer.tick(Duration::from_secs(10));
        let indices: Vec<usize> = reports.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1]);
        assert_eq!(y_of(&sequencer, "T-801"), DepotLayout::default().track_y(6));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let plan = vec![
            movement("T-801", 3, 1, ""),
            movement("T-803", 5, 3, ""),
            movement("T-801", 1, 2, ""),
        ];
        let mut sequencer = sequencer();
        sequencer.apply(plan.clone());
        run_to_end(&mut sequencer);
        let first = sequencer.positions().snapshot();

        sequencer.apply(plan);
        for _ in 0..40 {
            sequencer.tick(Duration::from_millis(100));
        }
        assert_eq!(sequencer.positions().snapshot(), first);
    }

    #[test]
    fn test_cancel_freezes_positions() {
        let mut sequencer = sequencer();
        sequencer.apply(vec![movement("T-801", 3, 1, ""), movement("T-802", 4, 2, "")]);
        sequencer.tick(SECOND);
        let frozen = sequencer.positions().clone();
        assert_eq!(sequencer.cancel(), 1);
        assert!(sequencer.tick(Duration::from_secs(5)).is_empty());
        assert_eq!(sequencer.positions(), &frozen);
    }

    #[test]
    fn test_rebase_restarts_plan() {
        let layout = DepotLayout::default();
        let mut sequencer = sequencer();
        sequencer.apply(vec![movement("T-801", 3, 1, ""), movement("T-805", 1, 2, "")]);
        sequencer.tick(SECOND);

        let assignment = TrackAssignment::resolve(["T-801", "T-805"], layout.track_count);
        sequencer.rebase(PositionStore::from_assignment(&assignment, &layout));
        assert_eq!(sequencer.positions().snapshot().len(), 2);
        assert_eq!(sequencer.positions(), &sequencer.initial);
        assert_eq!(sequencer.progress(), (0, 2));

        run_to_end(&mut sequencer);
        assert_eq!(y_of(&sequencer, "T-801"), layout.track_y(1));
        assert_eq!(y_of(&sequencer, "T-805"), layout.track_y(2));
    }
}
