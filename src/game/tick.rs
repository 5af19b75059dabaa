//! Broadcast Tick
//!
//! One process-wide recurring tick. Each pass mutates time-based cosmetic
//! state (color cadence, optional health drain); the caller then broadcasts
//! the full snapshot. The scheduler also decides when the tick runs: it is
//! started lazily on admission and stopped according to [`TickStopPolicy`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::game::player::PlayerId;
use crate::game::registry::PlayerRegistry;

/// Default tick period.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// A color counter above this value flips the color on its next evaluation.
pub const COLOR_TOGGLE_THRESHOLD: u32 = 3;

// =============================================================================
// POLICIES
// =============================================================================

/// When a running tick stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickStopPolicy {
    /// Stop once the last admitted player leaves.
    #[default]
    WhenEmpty,
    /// Stop whenever any admitted player leaves, even if others remain.
    /// The next admission restarts it. Kept for compatibility with older
    /// deployments; remaining players see no `update` until someone joins.
    AnyDisconnect,
}

/// How color flips are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorCadence {
    /// Every player carries its own counter and flips independently.
    #[default]
    PerPlayer,
    /// One counter shared by every player, advanced once per player per
    /// pass, so flips roll across the registry in lockstep.
    Shared,
}

/// Error parsing a policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParsePolicyError {
    kind: &'static str,
    value: String,
}

impl FromStr for TickStopPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "when-empty" => Ok(Self::WhenEmpty),
            "any-disconnect" => Ok(Self::AnyDisconnect),
            other => Err(ParsePolicyError {
                kind: "tick stop policy",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ColorCadence {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-player" => Ok(Self::PerPlayer),
            "shared" => Ok(Self::Shared),
            other => Err(ParsePolicyError {
                kind: "color cadence",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TickStopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WhenEmpty => "when-empty",
            Self::AnyDisconnect => "any-disconnect",
        })
    }
}

impl fmt::Display for ColorCadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerPlayer => "per-player",
            Self::Shared => "shared",
        })
    }
}

/// Tick configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct TickConfig {
    /// Period between passes.
    pub interval: Duration,
    /// When the tick stops.
    pub stop_policy: TickStopPolicy,
    /// Per-player or shared color counters.
    pub color_cadence: ColorCadence,
    /// Health removed from every living player each pass (0 = none).
    pub health_drain: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: TICK_INTERVAL,
            stop_policy: TickStopPolicy::default(),
            color_cadence: ColorCadence::default(),
            health_drain: 0.0,
        }
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Result of one pass.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Pass number since the process started.
    pub tick: u64,
    /// Players whose color flipped.
    pub flipped: usize,
    /// Players drained to 0 this pass.
    pub died: Vec<PlayerId>,
}

/// Run state and per-pass mutation for the broadcast tick.
#[derive(Debug)]
pub struct BroadcastScheduler {
    config: TickConfig,
    running: bool,
    shared_counter: u32,
    ticks: u64,
}

impl BroadcastScheduler {
    /// Create a stopped scheduler.
    pub fn new(config: TickConfig) -> Self {
        Self {
            config,
            running: false,
            shared_counter: 0,
            ticks: 0,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Whether the tick should currently be firing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total passes so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// A player was admitted. Returns true if this started the tick.
    pub fn on_admit(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.shared_counter = 0;
        true
    }

    /// An admitted player left and `remaining` players are still registered.
    /// Returns true if this stopped the tick.
    pub fn on_disconnect(&mut self, remaining: usize) -> bool {
        if !self.running {
            return false;
        }
        let stop = match self.config.stop_policy {
            TickStopPolicy::WhenEmpty => remaining == 0,
            TickStopPolicy::AnyDisconnect => true,
        };
        if stop {
            self.running = false;
        }
        stop
    }

    /// Run one pass over every registry entry.
    pub fn advance(&mut self, registry: &mut PlayerRegistry) -> TickResult {
        self.ticks += 1;
        let mut result = TickResult {
            tick: self.ticks,
            ..Default::default()
        };

        let cadence = self.config.color_cadence;
        let drain = self.config.health_drain;

        for player in registry.iter_mut() {
            let counter = match cadence {
                ColorCadence::PerPlayer => &mut player.color_ticks,
                ColorCadence::Shared => &mut self.shared_counter,
            };
            if color_due(counter) {
                player.color = player.color.toggled();
                result.flipped += 1;
            }

            if drain > 0.0 && player.alive {
                player.set_health((player.health - drain).max(0.0));
                if !player.alive {
                    result.died.push(player.id);
                }
            }
        }

        result
    }
}

/// Evaluate-then-increment; a due counter resets to 0.
#[inline]
fn color_due(counter: &mut u32) -> bool {
    let due = *counter > COLOR_TOGGLE_THRESHOLD;
    *counter += 1;
    if due {
        *counter = 0;
    }
    due
}
