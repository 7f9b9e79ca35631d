use crate::common::{HexColor, TrackNo};
use crate::fleet::Trainset;
use crate::simulation::movement::ShuntingPlan;
use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Geometry of the depot board, in board pixels.
///
/// Track `n` (1-based) occupies the band starting at `(n - 1) * (track_height + spacing)`; trains sit on the
/// band's centre line at `lane_x`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DepotLayout {
    pub track_count: TrackNo,
    pub track_height: f32,
    pub spacing: f32,
    pub track_length: f32,
    pub lane_x: f32,
    pub description: String,
}

impl Default for DepotLayout {
    fn default() -> Self {
        DepotLayout {
            track_count: 6,
            track_height: 16.0,
            spacing: 16.0,
            track_length: 500.0,
            lane_x: 250.0,
            description: String::from("Six parallel stabling tracks with a common throat"),
        }
    }
}

impl DepotLayout {
    pub fn track_y(&self, track: TrackNo) -> f32 {
        track.saturating_sub(1) as f32 * self.pitch() + self.track_height / 2.0
    }

    pub fn pitch(&self) -> f32 {
        self.track_height + self.spacing
    }

    pub fn height(&self) -> f32 {
        self.pitch() * self.track_count as f32
    }

    fn validate(&self) -> Result<(), DepotLoaderError> {
        if self.track_count == 0 {
            return Err(DepotLoaderError::InvalidLayout("depot must have at least one track"));
        }
        if ![self.track_height, self.spacing, self.track_length, self.lane_x].iter().all(|d| d.is_finite()) {
            return Err(DepotLoaderError::InvalidLayout("track dimensions must be finite numbers"));
        }
        if self.track_height <= 0.0 || self.spacing < 0.0 || self.track_length <= 0.0 {
            return Err(DepotLoaderError::InvalidLayout("track dimensions must be positive"));
        }
        Ok(())
    }
}

/// Playback timing of shunting plans. Step `i` (0-based) fires `initial_delay + i * step_delay` after the plan starts.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct StepTiming {
    pub initial_delay_ms: u64,
    pub step_delay_ms: u64,
}

impl Default for StepTiming {
    fn default() -> Self {
        StepTiming {
            initial_delay_ms: 1000,
            step_delay_ms: 1000,
        }
    }
}

impl StepTiming {
    /// Saturates at `Duration::MAX` rather than overflowing.
    pub fn due(&self, step: usize) -> Duration {
        let step = u64::try_from(step).unwrap_or(u64::MAX);
        Duration::from_millis(self.initial_delay_ms).saturating_add(Duration::from_millis(self.step_delay_ms.saturating_mul(step)))
    }
}

#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct BoardColors {
    pub background: HexColor,
    pub track: HexColor,
    pub service: HexColor,
    pub standby: HexColor,
    pub maintenance: HexColor,
    pub cleaning: HexColor,
}

impl Default for BoardColors {
    fn default() -> Self {
        BoardColors {
            background: HexColor::rgb_u8(0x1a, 0x1d, 0x23),
            track: HexColor::rgb_u8(0x4a, 0x50, 0x5c),
            service: HexColor::rgb_u8(0x22, 0xc5, 0x5e),
            standby: HexColor::rgb_u8(0xea, 0xb3, 0x08),
            maintenance: HexColor::rgb_u8(0xef, 0x44, 0x44),
            cleaning: HexColor::rgb_u8(0x3b, 0x82, 0xf6),
        }
    }
}

#[derive(Asset, TypePath, Deserialize, Debug)]
pub struct Depot {
    pub name: String,
    #[serde(default)]
    pub layout: DepotLayout,
    #[serde(default)]
    pub timing: StepTiming,
    #[serde(default)]
    pub colors: BoardColors,
    #[serde(default)]
    pub trainsets: Vec<Trainset>,
}

impl Depot {
    pub fn from_toml(contents: &str) -> Result<Depot, DepotLoaderError> {
        let depot: Depot = toml::from_str(contents)?;
        depot.layout.validate()?;
        Ok(depot)
    }
}

#[derive(Asset, TypePath, Deserialize, Debug, Default)]
pub struct PlanBook {
    #[serde(default)]
    pub plans: Vec<ShuntingPlan>,
}

impl PlanBook {
    pub fn from_toml(contents: &str) -> Result<PlanBook, DepotLoaderError> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Error)]
pub enum DepotLoaderError {
    #[error("could not read depot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("depot file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("could not parse depot file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid depot layout: {0}")]
    InvalidLayout(&'static str),
}

#[derive(Default, TypePath)]
pub struct DepotLoader;

impl AssetLoader for DepotLoader {
    type Asset = Depot;
    type Settings = ();
    type Error = DepotLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let contents = String::from_utf8(bytes)?;
        Depot::from_toml(&contents)
    }

    fn extensions(&self) -> &[&str] {
        &["depot.toml"]
    }
}

#[derive(Default, TypePath)]
pub struct PlanBookLoader;

impl AssetLoader for PlanBookLoader {
    type Asset = PlanBook;
    type Settings = ();
    type Error = DepotLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let contents = String::from_utf8(bytes)?;
        PlanBook::from_toml(&contents)
    }

    fn extensions(&self) -> &[&str] {
        &["plans.toml"]
    }
}

pub struct DepotPlugin;

impl Plugin for DepotPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<Depot>()
            .init_asset::<PlanBook>()
            .init_asset_loader::<DepotLoader>()
            .init_asset_loader::<PlanBookLoader>();
    }
}
