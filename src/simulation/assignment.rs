use crate::common::{TrackNo, TrainId, numeric_suffix};
use std::collections::{HashMap, HashSet};

/// Track a train would occupy if the depot were empty.
pub fn preferred_track(train_id: &str, track_count: TrackNo) -> TrackNo {
    let track_count = track_count.max(1);
    (numeric_suffix(train_id) as i64 - 1).rem_euclid(track_count as i64) as TrackNo + 1
}

/// Initial track of every train in the depot.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TrackAssignment {
    tracks: HashMap<TrainId, TrackNo>,
    order: Vec<TrainId>,
}

impl TrackAssignment {
    /// Assigns trains to tracks in input order.
    ///
    /// Each train takes its preferred track when it is free, otherwise the lowest free track. Once every track is
    /// taken the remaining trains fall back to their preferred track and share it with whoever is already there.
    pub fn resolve<'a, I: IntoIterator<Item = &'a str>>(train_ids: I, track_count: TrackNo) -> Self {
        let mut used: HashSet<TrackNo> = HashSet::new();
        let mut assignment = TrackAssignment::default();

        for train_id in train_ids {
            let preferred = preferred_track(train_id, track_count);
            let track = if !used.contains(&preferred) {
                preferred
            } else {
                (1..=track_count).find(|track| !used.contains(track)).unwrap_or(preferred)
            };
            used.insert(track);
            if assignment.tracks.insert(train_id.to_string(), track).is_none() {
                assignment.order.push(train_id.to_string());
            }
        }
        assignment
    }

    pub fn get(&self, train_id: &str) -> Option<TrackNo> {
        self.tracks.get(train_id).copied()
    }

    /// Trains with their tracks, in the order they were assigned.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TrackNo)> {
        self.order.iter().map(|id| (id.as_str(), self.tracks[id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn test_preferred_track() {
        let cases = [
            ("T-801", 6, 3),
            ("T-806", 6, 2),
            ("T-807", 6, 3),
            ("T-805", 12, 1),
            ("T-1", 6, 1),
            ("T-6", 6, 6),
            ("T-7", 6, 1),
        ];
        for (id, track_count, expected) in cases {
            assert_eq!(preferred_track(id, track_count), expected, "{id}");
        }
    }

    #[test]
    fn test_preferred_track_by_suffix() {
        for suffix in 1..=6 {
            let id = format!("T-{suffix}");
            assert_eq!(preferred_track(&id, 6), (suffix - 1) % 6 + 1);
        }
    }

    #[test]
    fn test_unparseable_id() {
        // id 0 wraps around to the last track
        assert_eq!(preferred_track("SHUNTER", 6), 6);
        assert_eq!(preferred_track("T-x", 4), 4);
    }

    #[test]
    fn test_no_shared_tracks_within_capacity() {
        let ids = ["T-801", "T-807", "T-813", "T-802", "T-808", "T-803"];
        let assignment = TrackAssignment::resolve(ids, 6);
        assert_eq!(assignment.iter().count(), 6);
        let tracks: Vec<TrackNo> = ids.iter().map(|id| assignment.get(id).unwrap()).collect();
        assert!(tracks.iter().all_unique());
        assert!(tracks.iter().all(|track| (1..=6).contains(track)));
        // T-807 and T-813 also prefer track 3 and take the lowest free tracks instead
        assert_eq!(tracks, [3, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn test_permutations_stay_injective() {
        let ids = ["T-801", "T-807", "T-813", "T-3", "A-9"];
        for permutation in ids.iter().copied().permutations(ids.len()) {
            let assignment = TrackAssignment::resolve(permutation, 6);
            assert!(assignment.iter().map(|(_, track)| track).all_unique());
        }
    }

    #[test]
    fn test_overflow_falls_back_to_preferred() {
        let ids = ["T-1", "T-2", "T-3", "T-4"];
        let assignment = TrackAssignment::resolve(ids, 3);
        assert_eq!(assignment.get("T-1"), Some(1));
        assert_eq!(assignment.get("T-2"), Some(2));
        assert_eq!(assignment.get("T-3"), Some(3));
        assert_eq!(assignment.get("T-4"), Some(1));
    }

    #[test]
    fn test_input_order_preserved() {
        let assignment = TrackAssignment::resolve(["T-805", "T-801"], 6);
        let order: Vec<&str> = assignment.iter().map(|(id, _)| id).collect();
        assert_eq!(order, ["T-805", "T-801"]);
        assert_eq!(TrackAssignment::resolve([], 6).iter().count(), 0);
    }
}
