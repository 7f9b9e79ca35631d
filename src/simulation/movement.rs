use crate::common::{TrackNo, TrainId};
use serde::{Deserialize, Serialize};

/// One proposed relocation of a train between depot tracks.
///
/// Only `train_id` and `to_track` drive the board; `from_track` and `reason` are carried for display.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Movement {
    pub train_id: TrainId,
    pub from_track: TrackNo,
    pub to_track: TrackNo,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ShuntingPlan {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub movements: Vec<Movement>,
}
