//! Edge Penalty
//!
//! Touching the arena's lethal band costs a fixed fraction of current health.
//! `move` (when the reported position is lethal) and `hitEdge` both end up
//! here, so the arithmetic is identical on either path.

use serde::{Deserialize, Serialize};

use crate::game::player::Player;

/// Fraction of health kept after one penalty.
pub const EDGE_PENALTY_FACTOR: f64 = 0.8;

/// Health below this after a penalty is floored to 0.
pub const DEATH_THRESHOLD: f64 = 1.0;

/// Multiplicative edge penalty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgePenalty {
    /// Multiplier applied to health (0.8 = lose 20%).
    pub factor: f64,
    /// Health below this floors to 0. 0 disables the floor.
    pub death_threshold: f64,
}

impl Default for EdgePenalty {
    fn default() -> Self {
        Self {
            factor: EDGE_PENALTY_FACTOR,
            death_threshold: DEATH_THRESHOLD,
        }
    }
}

/// What one penalty did to a player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PenaltyOutcome {
    /// Player was dead or already at 0 health.
    Skipped,
    /// Health dropped but the player survives.
    Damaged {
        /// Health before.
        before: f64,
        /// Health after.
        after: f64,
    },
    /// Health reached 0.
    Killed {
        /// Health before.
        before: f64,
    },
}

impl EdgePenalty {
    /// Health after one penalty from `health`: `max(0, health * factor)`,
    /// floored to 0 under the death threshold.
    pub fn next_health(&self, health: f64) -> f64 {
        let next = (health * self.factor).max(0.0);
        if next < self.death_threshold {
            0.0
        } else {
            next
        }
    }

    /// Apply once to `player`. Guarded by `alive && health > 0`.
    pub fn apply(&self, player: &mut Player) -> PenaltyOutcome {
        if !player.alive || player.health <= 0.0 {
            return PenaltyOutcome::Skipped;
        }

        let before = player.health;
        player.set_health(self.next_health(before));

        if player.alive {
            PenaltyOutcome::Damaged {
                before,
                after: player.health,
            }
        } else {
            PenaltyOutcome::Killed { before }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerId;

    fn player() -> Player {
        Player::new(PlayerId::generate(), "edge", 400.0, 300.0)
    }

    #[test]
    fn test_penalty_is_multiplicative() {
        let penalty = EdgePenalty::default();
        let mut p = player();

        penalty.apply(&mut p);
        assert!((p.health - 80.0).abs() < 1e-9);
        penalty.apply(&mut p);
        assert!((p.health - 64.0).abs() < 1e-9);
        penalty.apply(&mut p);
        assert!((p.health - 51.2).abs() < 1e-9);
        assert!(p.alive);

        // Not the additive rule
        assert!((p.health - 40.0).abs() > 1.0);
    }

    #[test]
    fn test_outcome_reports_before_and_after() {
        let penalty = EdgePenalty::default();
        let mut p = player();

        match penalty.apply(&mut p) {
            PenaltyOutcome::Damaged { before, after } => {
                assert_eq!(before, 100.0);
                assert!((after - 80.0).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_repeated_penalty_reaches_exactly_zero() {
        let penalty = EdgePenalty::default();
        let mut p = player();

        let mut hits = 0;
        loop {
            hits += 1;
            if let PenaltyOutcome::Killed { .. } = penalty.apply(&mut p) {
                break;
            }
            assert!(hits < 100, "player never died");
        }

        assert_eq!(p.health, 0.0);
        assert!(!p.alive);
        // 100 * 0.8^20 ~= 1.15, 100 * 0.8^21 ~= 0.92
        assert_eq!(hits, 21);
    }

    #[test]
    fn test_dead_player_is_skipped() {
        let penalty = EdgePenalty::default();
        let mut p = player();
        p.set_health(0.0);

        assert_eq!(penalty.apply(&mut p), PenaltyOutcome::Skipped);
        assert_eq!(p.health, 0.0);
    }

    #[test]
    fn test_floor_disabled_never_kills_quickly() {
        let penalty = EdgePenalty {
            death_threshold: 0.0,
            ..Default::default()
        };
        let mut p = player();

        for _ in 0..100 {
            penalty.apply(&mut p);
        }
        assert!(p.health > 0.0);
        assert!(p.alive);
    }

    #[test]
    fn test_next_health_never_negative() {
        let penalty = EdgePenalty {
            factor: -1.0,
            death_threshold: 0.0,
        };
        assert_eq!(penalty.next_health(50.0), 0.0);
    }
}
