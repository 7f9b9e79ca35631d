mod assets;
mod clock;
mod common;
mod debug_overlay;
mod depot;
mod display;
mod dropdown_menu;
mod export;
mod fleet;
mod playback_controls;
mod simulation;

use crate::assets::AssetLoadingPlugin;
use crate::clock::ClockPlugin;
use crate::debug_overlay::DebugOverlayPlugin;
use crate::depot::DepotPlugin;
use crate::display::DisplayPlugin;
use crate::dropdown_menu::DropdownPlugin;
use crate::playback_controls::PlaybackControlsPlugin;
use crate::simulation::SimulationPlugin;
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;
use bevy::prelude::*;

fn main() -> AppExit {
    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Depot Board".into(),
                    resolution: (1280, 800).into(),
                    ..default()
                }),
                ..default()
            }),
            FpsOverlayPlugin::default(),
        ))
        .add_plugins((
            AssetLoadingPlugin,
            DepotPlugin,
            ClockPlugin,
            SimulationPlugin,
            DisplayPlugin,
            DropdownPlugin,
            DebugOverlayPlugin,
            PlaybackControlsPlugin,
        ))
        .run()
}
