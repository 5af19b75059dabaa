//! Shared World
//!
//! Single owner of every piece of mutable game state: the player registry,
//! the connection-to-player bindings and the broadcast scheduler. All client
//! events and ticks are applied here, one at a time, by whoever holds the
//! `World` (the server's world task). Nothing else touches the registry.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{parse_var, ConfigError};
use crate::core::bounds::{LethalBoundary, Rect, SPAWN_AREA};
use crate::core::rng::SpawnRng;
use crate::game::edge::{EdgePenalty, PenaltyOutcome};
use crate::game::player::{Player, PlayerId};
use crate::game::registry::PlayerRegistry;
use crate::game::tick::{BroadcastScheduler, TickConfig, TickResult};
use crate::network::fanout::{ConnectionId, Fanout};
use crate::network::gate::{ConnectionGate, GateConfig, GateRejection};
use crate::network::protocol::ServerMessage;
use crate::network::validation::{ValidationConfig, ValidationError};

// =============================================================================
// CONFIG
// =============================================================================

/// World configuration.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Where new players appear.
    pub spawn_area: Rect,
    /// Arena and lethal margin.
    pub boundary: LethalBoundary,
    /// Edge penalty arithmetic.
    pub edge_penalty: EdgePenalty,
    /// Broadcast tick settings.
    pub tick: TickConfig,
    /// Coordinate hardening.
    pub validation: ValidationConfig,
    /// Admission rules.
    pub gate: GateConfig,
    /// Fixed spawn seed; None seeds from OS entropy.
    pub spawn_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            spawn_area: SPAWN_AREA,
            boundary: LethalBoundary::default(),
            edge_penalty: EdgePenalty::default(),
            tick: TickConfig::default(),
            validation: ValidationConfig::default(),
            gate: GateConfig::default(),
            spawn_seed: None,
        }
    }
}

impl WorldConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(crate::config::env_lookup)
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, "PRESENCE_TICK_MS")? {
            config.tick.interval = Duration::from_millis(ms.max(1));
        }
        if let Some(policy) = parse_var(&lookup, "PRESENCE_TICK_STOP")? {
            config.tick.stop_policy = policy;
        }
        if let Some(cadence) = parse_var(&lookup, "PRESENCE_COLOR_CADENCE")? {
            config.tick.color_cadence = cadence;
        }
        if let Some(drain) = parse_var::<f64, _>(&lookup, "PRESENCE_HEALTH_DRAIN")? {
            config.tick.health_drain = drain.max(0.0);
        }
        if let Some(limit) = parse_var::<f64, _>(&lookup, "PRESENCE_MAX_COORDINATE")? {
            if limit.is_nan() || limit < 0.0 {
                return Err(ConfigError {
                    key: "PRESENCE_MAX_COORDINATE",
                    value: limit.to_string(),
                    reason: "must be a non-negative number".to_string(),
                });
            }
            config.validation.max_abs_coordinate = limit;
        }
        config.spawn_seed = parse_var(&lookup, "PRESENCE_SPAWN_SEED")?;
        config.gate = GateConfig::from_lookup(&lookup)?;

        Ok(config)
    }
}

// =============================================================================
// COMMANDS & OUTCOMES
// =============================================================================

/// Everything that can happen to the world, in arrival order.
#[derive(Debug)]
pub enum WorldCommand<O> {
    /// A connection completed its handshake.
    Admit {
        /// Connection.
        conn: ConnectionId,
        /// Handshake token, if any.
        token: Option<String>,
        /// Where to deliver messages once admitted.
        outbox: O,
    },
    /// `move` event.
    Move {
        /// Connection.
        conn: ConnectionId,
        /// Reported X.
        x: f64,
        /// Reported Y.
        y: f64,
    },
    /// `hitEdge` event.
    HitEdge {
        /// Connection.
        conn: ConnectionId,
    },
    /// `jump` event.
    Jump {
        /// Connection.
        conn: ConnectionId,
        /// Vertical offset.
        xy: f64,
    },
    /// Transport closed.
    Disconnect {
        /// Connection.
        conn: ConnectionId,
    },
}

/// Admission failures.
#[derive(Debug, Error)]
pub enum AdmitError {
    /// The gate refused the token.
    #[error("rejected: {0}")]
    Rejected(#[from] GateRejection),
    /// This connection already has a player.
    #[error("connection already admitted")]
    AlreadyAdmitted,
}

/// Why a client event changed nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Ignored {
    /// Connection has no player.
    #[error("connection has no player")]
    NotAdmitted,
    /// Player is dead.
    #[error("player is dead")]
    Dead,
    /// Payload failed validation.
    #[error("invalid payload: {0}")]
    Invalid(#[from] ValidationError),
}

// =============================================================================
// WORLD
// =============================================================================

/// The authoritative shared world.
pub struct World<F: Fanout> {
    config: WorldConfig,
    gate: ConnectionGate,
    registry: PlayerRegistry,
    bindings: BTreeMap<ConnectionId, PlayerId>,
    scheduler: BroadcastScheduler,
    fanout: F,
    rng: SpawnRng,
}

impl<F: Fanout> World<F> {
    /// Create an empty world.
    pub fn new(config: WorldConfig, fanout: F) -> Self {
        let rng = SpawnRng::from_seed_or_entropy(config.spawn_seed);
        Self::with_rng(config, fanout, rng)
    }

    /// Create an empty world with an explicit spawn RNG.
    pub fn with_rng(config: WorldConfig, fanout: F, rng: SpawnRng) -> Self {
        Self {
            gate: ConnectionGate::new(config.gate.clone()),
            scheduler: BroadcastScheduler::new(config.tick.clone()),
            registry: PlayerRegistry::new(),
            bindings: BTreeMap::new(),
            config,
            fanout,
            rng,
        }
    }

    /// Read-only view of the registry.
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// The fanout in use.
    pub fn fanout(&self) -> &F {
        &self.fanout
    }

    /// Player bound to `conn`, if admitted.
    pub fn player_for(&self, conn: ConnectionId) -> Option<&Player> {
        self.bindings.get(&conn).and_then(|id| self.registry.get(id))
    }

    /// Number of admitted connections.
    pub fn admitted(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the broadcast tick should be firing.
    pub fn tick_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Broadcast tick period.
    pub fn tick_interval(&self) -> Duration {
        self.scheduler.config().interval
    }

    /// Apply one command. Failures are logged; clients never hear about them.
    pub fn apply(&mut self, command: WorldCommand<F::Outbox>) {
        match command {
            WorldCommand::Admit { conn, token, outbox } => {
                let _ = self.admit(conn, token.as_deref(), outbox);
            }
            WorldCommand::Move { conn, x, y } => {
                if let Err(reason) = self.on_move(conn, x, y) {
                    log_ignored("move", conn, &reason);
                }
            }
            WorldCommand::HitEdge { conn } => {
                if let Err(reason) = self.on_hit_edge(conn) {
                    log_ignored("hitEdge", conn, &reason);
                }
            }
            WorldCommand::Jump { conn, xy } => {
                if let Err(reason) = self.on_jump(conn, xy) {
                    log_ignored("jump", conn, &reason);
                }
            }
            WorldCommand::Disconnect { conn } => {
                self.on_disconnect(conn);
            }
        }
    }

    /// Admit `conn`: create its player, send `init` to it, `join` to the
    /// rest, and start the tick if it is not running.
    pub fn admit(
        &mut self,
        conn: ConnectionId,
        token: Option<&str>,
        outbox: F::Outbox,
    ) -> Result<PlayerId, AdmitError> {
        if self.bindings.contains_key(&conn) {
            warn!("Second handshake from {}, ignoring", conn);
            return Err(AdmitError::AlreadyAdmitted);
        }

        let admission = match self.gate.admit(token) {
            Ok(admission) => admission,
            Err(rejection) => {
                info!("Not admitting {}: {}", conn, rejection);
                return Err(rejection.into());
            }
        };

        let player = self
            .registry
            .create(&admission.name, &self.config.spawn_area, &mut self.rng)
            .clone();
        let id = player.id;

        self.bindings.insert(conn, id);
        self.fanout.attach(conn, outbox);

        self.fanout.send_to(
            conn,
            ServerMessage::Init {
                id,
                players: self.registry.all(),
            },
        );
        self.fanout.broadcast_except(conn, ServerMessage::Join(player));

        info!(
            "Admitted {} as {} (name {:?}), {} players",
            conn,
            id,
            admission.name,
            self.registry.len()
        );

        if self.scheduler.on_admit() {
            info!("Broadcast tick started ({:?})", self.tick_interval());
        }

        Ok(id)
    }

    /// `move`: penalize if the new position is lethal, always take the
    /// position, and echo it to everyone.
    pub fn on_move(
        &mut self,
        conn: ConnectionId,
        x: f64,
        y: f64,
    ) -> Result<Option<PenaltyOutcome>, Ignored> {
        let (x, y) = self.config.validation.check_move(x, y)?;

        let id = *self.bindings.get(&conn).ok_or(Ignored::NotAdmitted)?;
        let player = self.registry.get_mut(&id).ok_or(Ignored::NotAdmitted)?;
        if !player.accepts_events() {
            return Err(Ignored::Dead);
        }

        let penalty = if self.config.boundary.is_lethal(x, y) && player.health > 0.0 {
            Some(self.config.edge_penalty.apply(player))
        } else {
            None
        };

        player.x = x;
        player.y = y;

        if let Some(outcome) = penalty {
            log_penalty(&id, outcome);
        }

        self.fanout.broadcast(ServerMessage::Move { id, x, y });

        Ok(penalty)
    }

    /// `hitEdge`: same penalty as a lethal move, no position change and no
    /// immediate broadcast.
    pub fn on_hit_edge(&mut self, conn: ConnectionId) -> Result<PenaltyOutcome, Ignored> {
        let id = *self.bindings.get(&conn).ok_or(Ignored::NotAdmitted)?;
        let player = self.registry.get_mut(&id).ok_or(Ignored::NotAdmitted)?;
        if !player.accepts_events() {
            return Err(Ignored::Dead);
        }

        let outcome = self.config.edge_penalty.apply(player);
        log_penalty(&id, outcome);

        Ok(outcome)
    }

    /// `jump`: nudge Y by `xy`. Visible in the next `update`.
    pub fn on_jump(&mut self, conn: ConnectionId, xy: f64) -> Result<(), Ignored> {
        let xy = self.config.validation.check_jump(xy)?;

        let id = *self.bindings.get(&conn).ok_or(Ignored::NotAdmitted)?;
        let player = self.registry.get_mut(&id).ok_or(Ignored::NotAdmitted)?;
        if !player.accepts_events() {
            return Err(Ignored::Dead);
        }

        player.y += xy;
        Ok(())
    }

    /// Transport closed: drop the player, tell the others, and apply the
    /// tick stop policy. Safe to call more than once.
    pub fn on_disconnect(&mut self, conn: ConnectionId) -> Option<PlayerId> {
        let Some(id) = self.bindings.remove(&conn) else {
            debug!("{} closed without a player", conn);
            return None;
        };

        self.fanout.detach(conn);
        self.registry.remove(&id);
        self.fanout.broadcast(ServerMessage::Leave { id });

        info!("{} left ({}), {} players remain", id, conn, self.registry.len());

        if self.scheduler.on_disconnect(self.registry.len()) {
            info!(
                "Broadcast tick stopped ({} policy)",
                self.scheduler.config().stop_policy
            );
        }

        Some(id)
    }

    /// One broadcast pass: mutate cosmetic state, then send `update` to all.
    /// Does nothing while the tick is stopped.
    pub fn on_tick(&mut self) -> Option<TickResult> {
        if !self.scheduler.is_running() {
            return None;
        }

        let result = self.scheduler.advance(&mut self.registry);
        for id in &result.died {
            info!("Player {} drained to 0 health", id);
        }

        self.fanout.broadcast(ServerMessage::Update {
            players: self.registry.all(),
        });

        Some(result)
    }

    #[cfg(test)]
    fn bindings_consistent(&self) -> bool {
        self.bindings.len() == self.registry.len()
            && self.bindings.values().all(|id| self.registry.contains(id))
            && self.fanout.attached() == self.bindings.len()
    }
}

fn log_ignored(event: &str, conn: ConnectionId, reason: &Ignored) {
    match reason {
        Ignored::Invalid(e) => warn!("Dropped {} from {}: {}", event, conn, e),
        _ => debug!("Ignored {} from {}: {}", event, conn, reason),
    }
}

fn log_penalty(id: &PlayerId, outcome: PenaltyOutcome) {
    match outcome {
        PenaltyOutcome::Killed { before } => {
            info!("Player {} died at the edge (health was {:.2})", id, before);
        }
        PenaltyOutcome::Damaged { before, after } => {
            debug!("Edge penalty for {}: {:.2} -> {:.2}", id, before, after);
        }
        PenaltyOutcome::Skipped => {}
    }
}

// =============================================================================
// TESTS
// =============================================================================
