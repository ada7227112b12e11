#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat system that converts player contact into enemy damage.
//!
//! Attacks carry no input of their own: touching an enemy hurts it only while
//! the player is dashing or has spent the mid-air jump.

use glam::Vec3;
use log::debug;
use worldforge_core::{Command, CombatTuning, EnemyView, PlayerState};

/// Axis-aligned box described by its centre and half extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Centre of the box.
    pub center: Vec3,
    /// Half size along each axis.
    pub half_extents: Vec3,
}

impl Aabb {
    /// Reports whether the boxes overlap; touching faces count as overlap.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        let gap = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        gap.cmple(reach).all()
    }
}

/// Pure system that emits damage commands for enemies the player hits.
#[derive(Debug)]
pub struct Combat {
    damage: u32,
    player_half_extents: Vec3,
    enemy_half_extents: Vec3,
}

impl Combat {
    /// Creates a new combat system from its tuning.
    #[must_use]
    pub fn new(tuning: CombatTuning) -> Self {
        Self {
            damage: tuning.damage,
            player_half_extents: Vec3::from_array(tuning.player_half_extents).abs(),
            enemy_half_extents: Vec3::from_array(tuning.enemy_half_extents).abs(),
        }
    }

    /// Checks the player against every enemy and emits one hit per overlap.
    pub fn handle(&self, player: &PlayerState, enemies: &EnemyView, out: &mut Vec<Command>) {
        if !player.can_attack() || self.damage == 0 {
            return;
        }

        let attacker = Aabb {
            center: player.position,
            half_extents: self.player_half_extents,
        };
        for enemy in enemies.iter() {
            let body = Aabb {
                center: enemy.position + Vec3::Y * self.enemy_half_extents.y,
                half_extents: self.enemy_half_extents,
            };
            if attacker.intersects(&body) {
                debug!("player hits enemy {}", enemy.id.get());
                out.push(Command::DamageEnemy {
                    enemy: enemy.id,
                    amount: self.damage,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldforge_core::{EnemyId, EnemySnapshot, EntityId};

    fn enemy_at(id: u32, position: Vec3) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            entity: EntityId::new(id),
            position,
            health: 3,
            max_health: 3,
        }
    }

    fn dashing_at(position: Vec3) -> PlayerState {
        let mut state = PlayerState::spawned_at(position);
        state.is_dashing = true;
        state
    }

    #[test]
    fn grounded_walk_deals_no_damage() {
        let combat = Combat::new(CombatTuning::default());
        let mut state = PlayerState::spawned_at(Vec3::new(0.0, 1.0, 0.0));
        state.grounded = true;
        let enemies = EnemyView::from_snapshots(vec![enemy_at(0, Vec3::ZERO)]);
        let mut out = Vec::new();

        combat.handle(&state, &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn dash_hits_only_overlapping_enemies() {
        let combat = Combat::new(CombatTuning::default());
        let enemies = EnemyView::from_snapshots(vec![
            enemy_at(0, Vec3::new(1.0, 0.0, 0.0)),
            enemy_at(1, Vec3::new(5.0, 0.0, 0.0)),
        ]);
        let mut out = Vec::new();

        combat.handle(&dashing_at(Vec3::new(0.0, 1.0, 0.0)), &enemies, &mut out);

        assert_eq!(
            out,
            vec![Command::DamageEnemy {
                enemy: EnemyId::new(0),
                amount: 1
            }]
        );
    }

    #[test]
    fn player_high_above_misses() {
        let combat = Combat::new(CombatTuning::default());
        let enemies = EnemyView::from_snapshots(vec![enemy_at(0, Vec3::ZERO)]);
        let mut out = Vec::new();

        combat.handle(&dashing_at(Vec3::new(0.0, 10.0, 0.0)), &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn aabb_overlap_is_symmetric() {
        let a = Aabb {
            center: Vec3::ZERO,
            half_extents: Vec3::ONE,
        };
        let b = Aabb {
            center: Vec3::new(2.0, 0.5, -1.5),
            half_extents: Vec3::ONE,
        };
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        let far = Aabb {
            center: Vec3::new(2.1, 0.0, 0.0),
            ..b
        };
        assert!(!a.intersects(&far));
    }
}
