//! Single-threaded simulation session driven by the command-line adapter.
//!
//! Generation responses are applied between ticks, never inside one, so every
//! system observes either the old world or the new world in full.

use std::{collections::BTreeMap, time::Duration};

use serde::Serialize;
use worldforge_core::{Command, Event, HeldKeys, Population, SimulationConfig};
use worldforge_system_camera::OrbitCamera;
use worldforge_system_combat::Combat;
use worldforge_system_player::{JumpKind, PlayerController};
use worldforge_system_reconciliation::{
    Config as ReconciliationConfig, ReceiveOutcome, ReconcileError, Reconciliation,
};
use worldforge_world::{self as world, query, World};

/// Owns the world and every system that reads or mutates it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    reconciliation: Reconciliation,
    player: PlayerController,
    camera: OrbitCamera,
    combat: Combat,
}

impl Session {
    pub(crate) fn new(config: SimulationConfig) -> Self {
        let world = World::new(config.world.clone());
        let spawn = query::spawn_point(&world);
        let player = PlayerController::new(config.player, spawn);
        let camera = OrbitCamera::new(config.camera, player.state().position);
        Self {
            reconciliation: Reconciliation::new(ReconciliationConfig::new(
                config.world,
                config.placement,
            )),
            combat: Combat::new(config.combat),
            world,
            player,
            camera,
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Requests, receives, and commits one generation response.
    pub(crate) fn deliver(&mut self, payload: &str) -> Result<ReceiveOutcome, ReconcileError> {
        let generation = self.reconciliation.request();
        let mut commands = Vec::new();
        let outcome = self
            .reconciliation
            .receive(generation, payload, &mut commands)?;
        let events = self.execute(commands);
        self.observe(&events, HeldKeys::default());
        Ok(outcome)
    }

    pub(crate) fn jump(&mut self) -> Option<JumpKind> {
        self.player.jump()
    }

    pub(crate) fn dash(&mut self) -> bool {
        self.player.dash()
    }

    /// Advances the simulation by one fixed step.
    pub(crate) fn tick(&mut self, dt: Duration, held: HeldKeys) -> Vec<Event> {
        let mut events = self.execute(vec![Command::Tick { dt }]);
        self.observe(&events, held);

        let mut commands = Vec::new();
        self.combat.handle(
            self.player.state(),
            &query::enemy_view(&self.world),
            &mut commands,
        );
        events.extend(self.execute(commands));
        events
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let state = self.player.state();
        Snapshot {
            tick: query::tick_index(&self.world),
            player: state.position.to_array(),
            grounded: state.grounded,
            dashing: state.is_dashing,
            camera: self.camera.rig().position.to_array(),
            live_enemies: query::live_enemy_count(&self.world),
            populations: Population::ALL
                .into_iter()
                .map(|population| {
                    (
                        population.label(),
                        query::count_population(&self.world, population),
                    )
                })
                .collect(),
        }
    }

    fn execute(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        events
    }

    fn observe(&mut self, events: &[Event], held: HeldKeys) {
        self.camera.steer(events, held);
        self.player.handle(
            events,
            held,
            self.camera.yaw(),
            query::heightfield(&self.world),
            &query::obstacle_view(&self.world),
        );
        self.camera.follow(events, self.player.state().position);
    }
}

/// Summary printed at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Snapshot {
    pub(crate) tick: u64,
    pub(crate) player: [f32; 3],
    pub(crate) grounded: bool,
    pub(crate) dashing: bool,
    pub(crate) camera: [f32; 3],
    pub(crate) live_enemies: usize,
    pub(crate) populations: BTreeMap<&'static str, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(16);

    const VILLAGE: &str = r#"{
        "world": { "biome": "city", "heightmap_raw": [[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]] },
        "structures": {
            "trees": [{ "position": { "x": -30, "z": 10 } }, { "position": { "x": -30, "z": 30 } }],
            "buildings": [{ "type": "house" }, { "type": "skyscraper" }, { "type": "skyscraper" }]
        },
        "combat": { "enemies": [{ "position": { "x": 0, "z": 3 }, "health": 1 }, { "position": { "x": 40, "z": -40 } }] },
        "spawn_point": { "x": 0, "z": 0 }
    }"#;

    const VILLAGE_GROWN: &str = r#"{
        "world": { "biome": "city", "heightmap_raw": [[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]] },
        "structures": {
            "trees": [{ "position": { "x": -30, "z": 10 } }, { "position": { "x": -30, "z": 30 } }, { "position": { "x": -30, "z": 50 } }],
            "buildings": [{ "type": "house" }, { "type": "skyscraper" }, { "type": "skyscraper" }, { "type": "skyscraper" }]
        },
        "combat": { "enemies": [{ "position": { "x": 0, "z": 3 }, "health": 1 }, { "position": { "x": 40, "z": -40 } }] },
        "spawn_point": { "x": 0, "z": 0 }
    }"#;

    fn flat_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.occupancy_resolution = Some(64);
        config
    }

    fn forward() -> HeldKeys {
        HeldKeys {
            forward: true,
            ..HeldKeys::default()
        }
    }

    #[test]
    fn idle_player_rests_on_spawn() {
        let mut session = Session::new(flat_config());
        let _ = session
            .deliver(r#"{ "spawn_point": { "x": 0, "z": 0 } }"#)
            .expect("payload parses");

        let _ = session.tick(STEP, HeldKeys::default());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.player, [0.0, 1.0, 0.0]);
        assert!(snapshot.grounded);
    }

    #[test]
    fn dash_through_enemy_defeats_it() {
        let mut session = Session::new(flat_config());
        let _ = session
            .deliver(r#"{ "combat": { "enemies": [{ "position": { "x": 0, "z": 3 }, "health": 1 }] } }"#)
            .expect("payload parses");
        assert_eq!(session.snapshot().live_enemies, 1);

        assert!(session.dash());
        let defeated = (0..10)
            .flat_map(|_| session.tick(STEP, forward()))
            .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
            .count();

        assert_eq!(defeated, 1);
        assert_eq!(session.snapshot().live_enemies, 0);
    }

    #[test]
    fn walking_into_enemy_deals_no_damage() {
        let mut session = Session::new(flat_config());
        let _ = session
            .deliver(r#"{ "combat": { "enemies": [{ "position": { "x": 0, "z": 3 }, "health": 1 }] } }"#)
            .expect("payload parses");

        for _ in 0..30 {
            let _ = session.tick(STEP, forward());
        }

        assert_eq!(session.snapshot().live_enemies, 1);
    }

    #[test]
    fn malformed_update_keeps_session_running() {
        let mut session = Session::new(flat_config());
        let _ = session.deliver(VILLAGE).expect("payload parses");
        let before = session.snapshot();

        assert!(session.deliver("{ \"world\": ").is_err());

        assert_eq!(session.snapshot(), before);
    }

    fn replay() -> (Snapshot, Vec<worldforge_core::Entity>) {
        let mut session = Session::new(flat_config());
        let _ = session.deliver(VILLAGE).expect("payload parses");
        let held = HeldKeys {
            forward: true,
            look_right: true,
            ..HeldKeys::default()
        };
        for tick in 0..120 {
            if tick == 5 || tick == 12 {
                let _ = session.jump();
            }
            if tick == 40 {
                let _ = session.dash();
            }
            if tick == 60 {
                let _ = session.deliver(VILLAGE_GROWN).expect("payload parses");
            }
            let _ = session.tick(STEP, held);
        }
        (session.snapshot(), query::entities(session.world()).to_vec())
    }

    #[test]
    fn scripted_session_replays_identically() {
        let (first_snapshot, first_entities) = replay();
        let (second_snapshot, second_entities) = replay();

        assert_eq!(first_snapshot, second_snapshot);
        assert_eq!(first_entities, second_entities);
        assert_eq!(first_snapshot.tick, 120);
        assert_eq!(first_snapshot.populations["trees"], 3);
    }
}
