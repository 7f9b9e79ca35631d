use crate::common::{TrackNo, TrainId};
use crate::depot::DepotLayout;
use crate::simulation::assignment::TrackAssignment;
use bevy::math::Vec2;
use std::collections::HashMap;

/// Board coordinate of a single train, as handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionSnapshot {
    pub train_id: TrainId,
    pub x: f32,
    pub y: f32,
}

/// Current board coordinate of every train in the depot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionStore {
    positions: HashMap<TrainId, Vec2>,
}

impl PositionStore {
    pub fn from_assignment(assignment: &TrackAssignment, layout: &DepotLayout) -> Self {
        let positions = assignment
            .iter()
            .map(|(train_id, track)| (train_id.to_string(), Vec2::new(layout.lane_x, layout.track_y(track))))
            .collect();
        PositionStore { positions }
    }

    pub fn get(&self, train_id: &str) -> Option<Vec2> {
        self.positions.get(train_id).copied()
    }

    pub fn contains(&self, train_id: &str) -> bool {
        self.positions.contains_key(train_id)
    }

    /// Track whose centre line the train currently sits on, if it sits on one.
    pub fn track_of(&self, train_id: &str, layout: &DepotLayout) -> Option<TrackNo> {
        let y = self.get(train_id)?.y;
        (1..=layout.track_count).find(|&track| layout.track_y(track) == y)
    }

    /// Moves a train vertically, keeping its horizontal position. Returns the new coordinate, or `None` if the
    /// train is not on the board.
    pub(super) fn set_y(&mut self, train_id: &str, y: f32) -> Option<Vec2> {
        let position = self.positions.get_mut(train_id)?;
        position.y = y;
        Some(*position)
    }

    pub(super) fn reset_to(&mut self, initial: &PositionStore) {
        self.positions.clone_from(&initial.positions);
    }

    /// All positions, sorted by train identifier. This is what the board draws.
    pub fn snapshot(&self) -> Vec<PositionSnapshot> {
        let mut snapshot: Vec<PositionSnapshot> = self
            .positions
            .iter()
            .map(|(train_id, pos)| PositionSnapshot {
                train_id: train_id.clone(),
                x: pos.x,
                y: pos.y,
            })
            .collect();
        snapshot.sort_by(|a, b| a.train_id.cmp(&b.train_id));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PositionStore {
        let assignment = TrackAssignment::resolve(["T-801", "T-802"], 6);
        PositionStore::from_assignment(&assignment, &DepotLayout::default())
    }

    #[test]
    fn test_from_assignment() {
        let layout = DepotLayout::default();
        let store = store();
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.get("T-801"), Some(Vec2::new(250.0, layout.track_y(3))));
        assert_eq!(store.get("T-802"), Some(Vec2::new(250.0, layout.track_y(4))));
        assert_eq!(store.track_of("T-802", &layout), Some(4));
        assert_eq!(store.get("T-999"), None);
    }

    #[test]
    fn test_set_y_keeps_x() {
        let mut store = store();
        assert_eq!(store.set_y("T-801", 40.0), Some(Vec2::new(250.0, 40.0)));
        assert_eq!(store.set_y("T-999", 40.0), None);
        assert!(!store.contains("T-999"));
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let initial = store();
        let mut current = initial.clone();
        current.set_y("T-802", 0.0);
        assert_ne!(current, initial);
        current.reset_to(&initial);
        assert_eq!(current, initial);

        let ids: Vec<String> = current.snapshot().into_iter().map(|s| s.train_id).collect();
        assert_eq!(ids, ["T-801", "T-802"]);
    }

    #[test]
    fn test_snapshot_follows_moves() {
        let layout = DepotLayout::default();
        let mut store = store();
        store.set_y("T-802", layout.track_y(1));
        assert_eq!(
            store.snapshot(),
            [
                PositionSnapshot {
                    train_id: "T-801".into(),
                    x: 250.0,
                    y: layout.track_y(3),
                },
                PositionSnapshot {
                    train_id: "T-802".into(),
                    x: 250.0,
                    y: layout.track_y(1),
                },
            ]
        );
    }
}
