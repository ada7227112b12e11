use std::time::Duration;

use glam::Vec3;
use worldforge_core::{Command, Event, HeldKeys, PlayerTuning};
use worldforge_system_player::PlayerController;
use worldforge_system_reconciliation::{Config, Reconciliation};
use worldforge_world::{self as world, query, World};

const DT: Duration = Duration::from_micros(62_500);

fn load(world: &mut World, payload: &str) -> Vec<Event> {
    let mut reconciliation = Reconciliation::new(Config::default());
    let generation = reconciliation.request();
    let mut commands = Vec::new();
    let _ = reconciliation
        .receive(generation, payload, &mut commands)
        .expect("fixture parses");
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn tick(world: &mut World, controller: &mut PlayerController, held: HeldKeys) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: DT }, &mut events);
    controller.handle(
        &events,
        held,
        0.0,
        query::heightfield(world),
        &query::obstacle_view(world),
    );
}

#[test]
fn first_world_respawns_player_on_raised_terrain() {
    let mut world = World::default();
    let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);

    let events = load(
        &mut world,
        r#"{ "world": { "heightmap_raw": [[2, 2], [2, 2]] }, "spawn_point": { "x": 10, "z": -5 } }"#,
    );
    controller.handle(
        &events,
        HeldKeys::default(),
        0.0,
        query::heightfield(&world),
        &query::obstacle_view(&world),
    );
    tick(&mut world, &mut controller, HeldKeys::default());

    let state = controller.state();
    assert_eq!(state.position, Vec3::new(10.0, 3.0, -5.0));
    assert!(state.grounded);
    assert_eq!(state.velocity.y, 0.0);
}

#[test]
fn street_lamp_blocks_walking_into_it() {
    let mut world = World::default();
    let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);
    let events = load(
        &mut world,
        r#"{ "structures": { "street_lamps": [{ "position": { "x": 0, "z": 2.5 } }] } }"#,
    );
    controller.handle(
        &events,
        HeldKeys::default(),
        0.0,
        query::heightfield(&world),
        &query::obstacle_view(&world),
    );

    let forward = HeldKeys {
        forward: true,
        ..HeldKeys::default()
    };
    for _ in 0..8 {
        tick(&mut world, &mut controller, forward);
    }

    let z = controller.state().position.z;
    assert!(z > 0.0, "player approached the lamp");
    assert!(z < 2.5 - 1.0, "player never overlaps the lamp");
}

#[test]
fn enemies_do_not_block_movement() {
    let mut world = World::default();
    let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);
    let events = load(
        &mut world,
        r#"{ "combat": { "enemies": [{ "position": { "x": 0, "z": 1 } }] } }"#,
    );
    controller.handle(
        &events,
        HeldKeys::default(),
        0.0,
        query::heightfield(&world),
        &query::obstacle_view(&world),
    );

    let forward = HeldKeys {
        forward: true,
        ..HeldKeys::default()
    };
    for _ in 0..4 {
        tick(&mut world, &mut controller, forward);
    }

    assert!((controller.state().position.z - 2.5).abs() < 1e-4);
}
