use crate::assets::{AssetHandles, LoadingState};
use crate::clock::DepotClock;
use crate::common::TrainId;
use crate::depot::{BoardColors, Depot, DepotLayout};
use crate::dropdown_menu::DropDownMenu;
use crate::fleet::{Fleet, JobCardStatus, MAINTENANCE_FINDINGS, OperationalStatus, TrainsetUpdate};
use crate::simulation::messages::ShuntingStep;
use crate::simulation::positions::PositionSnapshot;
use crate::simulation::sequencer::StepOutcome;
use crate::simulation::{BoardRebuilt, Shunting};
use bevy::prelude::*;
use std::collections::{HashMap, VecDeque};

const GLYPH_SIZE: Vec2 = Vec2::new(48.0, 12.0);
const GLYPH_Z: f32 = 1.0;
const GLYPH_SPEED: f32 = 6.0;
const TIE_HEIGHT: f32 = 4.0;
const LOG_LINES: usize = 12;
const MILEAGE_LEADERS: usize = 5;
const TEXT_COLOR_DIM: Color = Color::srgb(0.6, 0.6, 0.6);

#[derive(Component)]
#[require(Pickable)]
pub struct TrainGlyph(pub TrainId);

/// Where the glyph is heading; the glyph eases towards it every frame.
#[derive(Component)]
struct GlyphTarget(Vec3);

#[derive(Component)]
struct TrackBand;

#[derive(Component)]
struct PlanHeader;

#[derive(Component)]
struct MovementLog;

#[derive(Component)]
struct FleetSummary;

#[derive(Resource, Deref, DerefMut, Default)]
struct GlyphMapper(HashMap<TrainId, Entity>);

#[derive(Resource, Default)]
struct LogLines(VecDeque<String>);

#[derive(Resource)]
struct BoardStyle {
    layout: DepotLayout,
    colors: BoardColors,
}

impl BoardStyle {
    /// Board pixels (origin top-left, y down) to world space (origin centre, y up).
    fn to_world(&self, position: Vec2) -> Vec3 {
        Vec3::new(
            position.x - self.layout.track_length / 2.0,
            self.layout.height() / 2.0 - position.y,
            GLYPH_Z,
        )
    }

    fn status_color(&self, status: OperationalStatus) -> Color {
        match status {
            OperationalStatus::Service => self.colors.service.into(),
            OperationalStatus::Standby => self.colors.standby.into(),
            OperationalStatus::Maintenance => self.colors.maintenance.into(),
            OperationalStatus::Cleaning => self.colors.cleaning.into(),
        }
    }
}

/// Event fired after new train glyphs were spawned, so that hover observers can be attached to them.
#[derive(Event)]
pub struct GlyphsSpawned(pub Vec<Entity>);

#[derive(EntityEvent)]
struct TrainMenuEvent {
    entity: Entity,
    action: TrainMenu,
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
enum TrainMenu {
    Assign(OperationalStatus),
    JobCard(JobCardStatus),
    /// Opens a job card with the finding at this index of [`MAINTENANCE_FINDINGS`].
    LogFinding(usize),
    ClearLog,
}

impl TrainMenu {
    fn update_for(&self, train_id: &str) -> TrainsetUpdate {
        match *self {
            TrainMenu::Assign(status) => TrainsetUpdate::status(train_id, status),
            TrainMenu::JobCard(job_card) => TrainsetUpdate::job_card(train_id, job_card),
            TrainMenu::LogFinding(index) => {
                let notes = MAINTENANCE_FINDINGS.get(index).copied().unwrap_or_default();
                TrainsetUpdate::maintenance_log(train_id, JobCardStatus::Open, notes)
            }
            TrainMenu::ClearLog => TrainsetUpdate::maintenance_log(train_id, JobCardStatus::Closed, ""),
        }
    }
}

impl DropDownMenu for TrainMenu {
    fn trigger(&self, commands: &mut Commands, target: Entity) {
        commands.trigger(TrainMenuEvent {
            entity: target,
            action: *self,
        });
    }

    fn get_label(&self) -> String {
        match self {
            TrainMenu::Assign(status) => format!("Assign to {}", status),
            TrainMenu::JobCard(job_card) => format!("Job card: {}", job_card),
            TrainMenu::LogFinding(index) => format!("Log: {}", MAINTENANCE_FINDINGS.get(*index).unwrap_or(&"")),
            TrainMenu::ClearLog => String::from("Close job card and clear log"),
        }
    }

    fn list_available_items() -> impl IntoIterator<Item = Self> {
        OperationalStatus::ALL.into_iter().map(TrainMenu::Assign).chain([
            TrainMenu::JobCard(JobCardStatus::Open),
            TrainMenu::JobCard(JobCardStatus::InProgress),
            TrainMenu::JobCard(JobCardStatus::Closed),
        ])
        .chain((0..MAINTENANCE_FINDINGS.len()).map(TrainMenu::LogFinding))
        .chain([TrainMenu::ClearLog])
    }
}

pub struct DisplayPlugin;

impl Plugin for DisplayPlugin {
    fn build(&self, app: &mut App) {
        TrainMenu::init(app);
        app.init_resource::<GlyphMapper>()
            .init_resource::<LogLines>()
            .add_systems(Startup, startup)
            .add_systems(
                Update,
                (
                    sync_glyphs.run_if(resource_exists_and_changed::<Shunting>),
                    recolor_glyphs.run_if(resource_exists_and_changed::<Fleet>),
                    move_glyphs,
                    log_steps,
                    update_panels,
                )
                    .chain()
                    .run_if(in_state(LoadingState::Loaded).and(resource_exists::<BoardStyle>)),
            );
    }
}

fn startup(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.add_observer(on_board_rebuilt);
    commands.add_observer(on_train_action);

    commands.spawn((
        PlanHeader,
        Text::default(),
        TextFont::from_font_size(16.0),
        Node {
            position_type: PositionType::Absolute,
            top: px(12),
            left: px(12),
            ..default()
        },
        Pickable::IGNORE,
    ));
    commands.spawn((
        MovementLog,
        Text::default(),
        TextFont::from_font_size(12.0),
        TextColor(TEXT_COLOR_DIM),
        Node {
            position_type: PositionType::Absolute,
            top: px(12),
            right: px(12),
            max_width: px(420),
            ..default()
        },
        Pickable::IGNORE,
    ));
    commands.spawn((
        FleetSummary,
        Text::default(),
        TextFont::from_font_size(12.0),
        Node {
            position_type: PositionType::Absolute,
            bottom: px(12),
            right: px(12),
            ..default()
        },
        Pickable::IGNORE,
    ));
}

fn on_board_rebuilt(
    _: On<BoardRebuilt>,
    handles: Res<AssetHandles>,
    depots: Res<Assets<Depot>>,
    tracks: Query<Entity, With<TrackBand>>,
    mut mapper: ResMut<GlyphMapper>,
    mut clear_color: ResMut<ClearColor>,
    shunting: Option<ResMut<Shunting>>,
    mut commands: Commands,
) {
    let Some(depot) = depots.get(&handles.depot) else {
        return;
    };
    let style = BoardStyle {
        layout: depot.layout.clone(),
        colors: depot.colors,
    };
    *clear_color = ClearColor(style.colors.background.into());

    for entity in tracks.iter().chain(mapper.drain().map(|(_, entity)| entity)) {
        commands.entity(entity).despawn();
    }

    let layout = &style.layout;
    let track_color: Color = style.colors.track.into();
    for track in 1..=layout.track_count {
        let centre = style.to_world(Vec2::new(layout.track_length / 2.0, layout.track_y(track)));
        commands
            .spawn((
                TrackBand,
                Sprite::from_color(track_color.with_alpha(0.5), Vec2::new(layout.track_length, layout.track_height)),
                Transform::from_translation(centre.with_z(0.0)),
                Pickable::IGNORE,
            ))
            .with_children(|p| {
                p.spawn((
                    Sprite::from_color(track_color, Vec2::new(layout.track_length, TIE_HEIGHT)),
                    Transform::from_xyz(0.0, 0.0, 0.1),
                    Pickable::IGNORE,
                ));
                p.spawn((
                    Text2d::new(track.to_string()),
                    TextFont::from_font_size(10.0),
                    TextColor(TEXT_COLOR_DIM),
                    Transform::from_xyz(-layout.track_length / 2.0 - 12.0, 0.0, 0.1),
                    Pickable::IGNORE,
                ));
            });
    }
    commands.insert_resource(style);
    // glyphs were dropped above, respawn them on the next sync
    if let Some(mut shunting) = shunting {
        shunting.set_changed();
    }
    debug!("Board rebuilt with {} tracks", depot.layout.track_count);
}

fn spawn_glyph(commands: &mut Commands, train_id: &str, color: Color, position: Vec3) -> Entity {
    commands
        .spawn((
            TrainGlyph(train_id.to_string()),
            GlyphTarget(position),
            Sprite::from_color(color, GLYPH_SIZE),
            Transform::from_translation(position),
        ))
        .with_child((
            Text2d::new(train_id),
            TextFont::from_font_size(9.0),
            TextColor(Color::BLACK),
            Transform::from_xyz(0.0, 0.0, 0.1),
            Pickable::IGNORE,
        ))
        .id()
}

fn sync_glyphs(
    shunting: Res<Shunting>,
    fleet: Res<Fleet>,
    style: Res<BoardStyle>,
    mut mapper: ResMut<GlyphMapper>,
    mut targets: Query<&mut GlyphTarget>,
    mut commands: Commands,
) {
    let positions = shunting.sequencer.positions();
    mapper.retain(|train_id, entity| {
        let keep = positions.contains(train_id);
        if !keep {
            commands.entity(*entity).despawn();
        }
        keep
    });

    let mut spawned = Vec::new();
    for PositionSnapshot { train_id, x, y } in positions.snapshot() {
        let world = style.to_world(Vec2::new(x, y));
        let existing = mapper.get(&train_id).and_then(|&entity| targets.get_mut(entity).ok());
        match existing {
            Some(mut target) => target.0 = world,
            None => {
                let status = fleet.get(&train_id).map(|t| t.status).unwrap_or(OperationalStatus::Standby);
                let entity = spawn_glyph(&mut commands, &train_id, style.status_color(status), world);
                mapper.insert(train_id, entity);
                spawned.push(entity);
            }
        }
    }

    if !spawned.is_empty() {
        TrainMenu::register(&mut commands, spawned.iter().copied());
        commands.trigger(GlyphsSpawned(spawned));
    }
}

fn recolor_glyphs(fleet: Res<Fleet>, style: Res<BoardStyle>, mut glyphs: Query<(&TrainGlyph, &mut Sprite)>) {
    for (glyph, mut sprite) in &mut glyphs {
        if let Some(trainset) = fleet.get(&glyph.0) {
            sprite.color = style.status_color(trainset.status);
        }
    }
}

fn move_glyphs(time: Res<Time>, mut glyphs: Query<(&GlyphTarget, &mut Transform)>) {
    let factor = 1.0 - (-GLYPH_SPEED * time.delta_secs()).exp();
    for (target, mut transform) in &mut glyphs {
        if transform.translation.distance_squared(target.0) < 0.01 {
            transform.translation = target.0;
        } else {
            transform.translation = transform.translation.lerp(target.0, factor);
        }
    }
}

fn on_train_action(event: On<TrainMenuEvent>, glyphs: Query<&TrainGlyph>, mut updates: MessageWriter<TrainsetUpdate>) {
    let Ok(glyph) = glyphs.get(event.entity) else {
        return;
    };
    let update = event.action.update_for(&glyph.0);
    debug!("Used '{}' on trainset {}", event.action.get_label(), glyph.0);
    updates.write(update);
}

fn log_steps(
    mut steps: MessageReader<ShuntingStep>,
    mut lines: ResMut<LogLines>,
    mut text: Single<&mut Text, With<MovementLog>>,
) {
    let mut changed = false;
    for step in steps.read() {
        let report = &step.report;
        let movement = &report.movement;
        let line = match report.outcome {
            StepOutcome::Moved(_) => format!(
                "{}  {}/{}  {}  {} -> {}  {}",
                step.at.format("%H:%M:%S"),
                report.index + 1,
                report.total,
                movement.train_id,
                movement.from_track,
                movement.to_track,
                movement.reason
            ),
            StepOutcome::UnknownTrain => format!(
                "{}  {}/{}  {}  skipped, not in depot",
                step.at.format("%H:%M:%S"),
                report.index + 1,
                report.total,
                movement.train_id
            ),
        };
        lines.0.push_back(line);
        if lines.0.len() > LOG_LINES {
            lines.0.pop_front();
        }
        changed = true;
    }
    if changed {
        text.0 = lines.0.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
    }
}

fn update_panels(
    shunting: Res<Shunting>,
    fleet: Res<Fleet>,
    clock: Res<DepotClock>,
    mut header: Single<&mut Text, (With<PlanHeader>, Without<FleetSummary>)>,
    mut summary: Single<&mut Text, (With<FleetSummary>, Without<PlanHeader>)>,
) {
    let (fired, total) = shunting.sequencer.progress();
    let plan = match &shunting.plan_name {
        Some(name) if shunting.sequencer.is_running() => format!("Plan: {} (step {}/{})", name, fired, total),
        Some(name) => format!("Plan: {} (complete)", name),
        None => String::from("No plan running"),
    };
    header.0 = format!("Depot time {}\n{}\n{}", clock.formatted(), plan, shunting.plan_summary);

    if fleet.is_changed() || summary.0.is_empty() {
        let leaders = fleet
            .mileage_leaders(MILEAGE_LEADERS)
            .iter()
            .map(|t| format!("  {}  {} km", t.id, t.mileage))
            .collect::<Vec<_>>()
            .join("\n");
        summary.0 = format!(
            "SLA coverage {:.1}% ({} of {} in service)\nMileage leaders:\n{}",
            fleet.sla_coverage(),
            fleet.count_with_status(OperationalStatus::Service),
            fleet.len(),
            leaders
        );
    }
}
