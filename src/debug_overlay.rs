use crate::display::{GlyphsSpawned, TrainGlyph};
use crate::fleet::Fleet;
use crate::simulation::Shunting;
use bevy::prelude::*;
use std::ops::DerefMut;

#[derive(Component)]
struct DetailsInfo;

pub struct DebugOverlayPlugin;

impl Plugin for DebugOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup);
    }
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Text::new(
            "1-9 to run a shunting plan\n\
                  R to replay, C to clear the plan\n\
                  Up or Down to change the speed, P to pause\n\
                  E to export the planner request and induction plan\n\
                  L to reload the depot file\n\
                  Hover over trains to see info, right-click to reassign",
        ),
        TextFont::from_font_size(16.0),
        Node {
            position_type: PositionType::Absolute,
            bottom: px(12),
            left: px(12),
            ..default()
        },
        Pickable::IGNORE,
    ));

    commands
        .spawn((
            DetailsInfo,
            Node {
                position_type: PositionType::Absolute,
                border: UiRect::all(px(1)),
                padding: UiRect::all(px(5)),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BorderRadius::all(px(3.0)),
            BackgroundColor(Color::srgb(0.21, 0.21, 0.21)),
            BorderColor::all(Color::WHITE),
            ZIndex(99),
            Pickable::IGNORE,
            Visibility::Hidden,
        ))
        .with_children(|p| {
            p.spawn((Text::default(), TextFont::from_font_size(10.0))); // id and track
            p.spawn((Text::default(), TextFont::from_font_size(10.0))); // status
            p.spawn((Text::default(), TextFont::from_font_size(10.0))); // notes
        });

    commands.add_observer(on_glyphs_spawned);
}

fn on_glyphs_spawned(event: On<GlyphsSpawned>, mut commands: Commands) {
    let mut on_over = Observer::new(on_over_train);
    let mut on_out = Observer::new(on_out_train);

    on_over.watch_entities(event.0.iter().copied());
    on_out.watch_entities(event.0.iter().copied());

    commands.spawn(on_over);
    commands.spawn(on_out);
}

fn on_over_train(
    event: On<Pointer<Over>>,
    fleet: If<Res<Fleet>>,
    shunting: If<Res<Shunting>>,
    glyphs: Query<&TrainGlyph>,
    mut info: Single<(&Children, &mut Visibility, &mut Node), With<DetailsInfo>>,
    mut writer: TextUiWriter,
) {
    let Ok(glyph) = glyphs.get(event.entity) else {
        return;
    };
    let Some(trainset) = fleet.get(&glyph.0) else {
        return;
    };

    let (children, vis, node) = info.deref_mut();
    let sequencer = &shunting.sequencer;
    let track = sequencer
        .positions()
        .track_of(&trainset.id, sequencer.layout())
        .map_or_else(|| String::from("off track"), |track| format!("track {}", track));
    *writer.text(children[0], 0) = format!("Trainset {}, {}", trainset.id, track);
    *writer.text(children[1], 0) = format!(
        "{}, {}, job card {}, {} km, SLA {}",
        trainset.status, trainset.fitness_status, trainset.job_card_status, trainset.mileage, trainset.sla_priority
    );
    match &trainset.maintenance_notes {
        Some(notes) => *writer.text(children[2], 0) = format!("Notes: {}", notes),
        None => writer.text(children[2], 0).clear(),
    }
    **vis = Visibility::Visible;
    node.left = px(event.pointer_location.position.x + 10.0);
    node.top = px(event.pointer_location.position.y + 10.0);
}

fn on_out_train(_: On<Pointer<Out>>, mut vis_info: Single<&mut Visibility, With<DetailsInfo>>) {
    **vis_info = Visibility::Hidden;
}
