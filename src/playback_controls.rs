use crate::assets::{DEPOT_PATH, LoadingState};
use crate::clock::DepotClock;
use crate::export::{self, INDUCTION_PLAN_PATH, InductionPlan, PLANNER_REQUEST_PATH, PlannerRequest};
use crate::fleet::Fleet;
use crate::simulation::messages::PlanCommand;
use crate::simulation::{Plans, Shunting};
use bevy::dev_tools::fps_overlay::FpsOverlayConfig;
use bevy::prelude::*;
use std::time::Duration;

const MULTIPLIERS: [f64; 7] = [0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
const DEFAULT_MULTIPLIER_INDEX: usize = 2;

const PLAN_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

#[derive(Resource)]
pub struct PlaybackControls {
    pub time_scale: f64,
    pub multiplier_index: usize,
    pub paused: bool,
}

impl PlaybackControls {
    fn faster(&mut self) -> Option<f64> {
        if self.multiplier_index + 1 < MULTIPLIERS.len() {
            self.multiplier_index += 1;
            self.time_scale = MULTIPLIERS[self.multiplier_index];
            return Some(self.time_scale);
        }
        None
    }

    fn slower(&mut self) -> Option<f64> {
        if self.multiplier_index > 0 {
            self.multiplier_index -= 1;
            self.time_scale = MULTIPLIERS[self.multiplier_index];
            return Some(self.time_scale);
        }
        None
    }

    pub fn formatted(&self) -> String {
        let scale = if self.time_scale >= 1.0 {
            format!("{}x", self.time_scale as u32)
        } else {
            format!("{:.2}x", self.time_scale)
        };
        if self.paused { format!("{} (paused)", scale) } else { scale }
    }
}

impl Default for PlaybackControls {
    fn default() -> Self {
        PlaybackControls {
            time_scale: MULTIPLIERS[DEFAULT_MULTIPLIER_INDEX],
            multiplier_index: DEFAULT_MULTIPLIER_INDEX,
            paused: false,
        }
    }
}

#[derive(Component)]
struct TimeScaleText;

pub struct PlaybackControlsPlugin;

impl Plugin for PlaybackControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlaybackControls>()
            .add_systems(Startup, setup)
            .add_systems(Update, (time_controls, update_time_scale_text).chain())
            .add_systems(
                Update,
                (plan_controls, export_controls, reload_controls).run_if(in_state(LoadingState::Loaded)),
            );
    }
}

fn setup(mut commands: Commands, controls: Res<PlaybackControls>) {
    commands.spawn((
        Node {
            right: px(100),
            bottom: px(12),
            position_type: PositionType::Absolute,
            ..default()
        },
        Text::new(controls.formatted()),
        TextFont::from_font_size(20.0),
        TextColor(Color::WHITE),
        TimeScaleText,
        GlobalZIndex(i32::MAX),
        Pickable::IGNORE,
    ));
}

fn time_controls(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut controls: ResMut<PlaybackControls>,
    mut time: ResMut<Time<Virtual>>,
    mut overlay_config: ResMut<FpsOverlayConfig>,
) {
    let new_time_scale = if keyboard_input.just_pressed(KeyCode::ArrowUp) {
        controls.faster()
    } else if keyboard_input.just_pressed(KeyCode::ArrowDown) {
        controls.slower()
    } else {
        None
    };
    if let Some(new_time_scale) = new_time_scale {
        time.set_relative_speed_f64(new_time_scale);
        overlay_config.refresh_interval = Duration::from_millis((100.0 * new_time_scale) as u64);
        info!("Playback speed set to {}", controls.formatted());
    }

    if keyboard_input.just_pressed(KeyCode::KeyP) {
        controls.paused = !controls.paused;
        if controls.paused {
            time.pause();
            info!("Playback paused");
        } else {
            time.unpause();
            info!("Playback resumed");
        }
    }
}

fn update_time_scale_text(controls: Res<PlaybackControls>, mut text: Single<&mut Text, With<TimeScaleText>>) {
    if controls.is_changed() {
        text.0 = controls.formatted();
    }
}

fn plan_controls(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    plans: Res<Plans>,
    mut plan_commands: MessageWriter<PlanCommand>,
) {
    for (index, key) in PLAN_KEYS.iter().enumerate() {
        if keyboard_input.just_pressed(*key) {
            match plans.get(index) {
                Some(plan) => {
                    plan_commands.write(PlanCommand::Run(plan.clone()));
                }
                None => warn!("No shunting plan under key {}", index + 1),
            }
        }
    }
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        plan_commands.write(PlanCommand::Replay);
    }
    if keyboard_input.just_pressed(KeyCode::KeyC) {
        plan_commands.write(PlanCommand::Clear);
    }
}

fn export_controls(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    fleet: If<Res<Fleet>>,
    shunting: If<Res<Shunting>>,
    clock: Res<DepotClock>,
) {
    if !keyboard_input.just_pressed(KeyCode::KeyE) {
        return;
    }

    let sequencer = &shunting.sequencer;
    let request = PlannerRequest::new(&fleet, sequencer.positions(), sequencer.layout());
    match export::write_toml(&request, PLANNER_REQUEST_PATH) {
        Ok(()) => info!("Planner request written to {}", PLANNER_REQUEST_PATH),
        Err(err) => error!("{}", err),
    }

    let plan = InductionPlan::new(&fleet, clock.current().format("%Y-%m-%d %H:%M:%S").to_string());
    match export::write_toml(&plan, INDUCTION_PLAN_PATH) {
        Ok(()) => info!("Induction plan written to {}", INDUCTION_PLAN_PATH),
        Err(err) => error!("{}", err),
    }
}

fn reload_controls(keyboard_input: Res<ButtonInput<KeyCode>>, asset_server: Res<AssetServer>) {
    if keyboard_input.just_pressed(KeyCode::KeyL) {
        info!("Reloading {}", DEPOT_PATH);
        asset_server.reload(DEPOT_PATH);
    }
}
