//! Player State
//!
//! One `Player` per admitted connection. Only the server mutates these.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (random UUID, never reused).
///
/// Serializes as the hyphenated UUID string so it can key JSON maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// COLOR
// =============================================================================

/// The two-entry palette players cycle through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Starting color.
    #[default]
    #[serde(rename = "#1133CC")]
    Blue,
    /// Alternate color.
    #[serde(rename = "#FF1122")]
    Red,
}

impl Color {
    /// The other palette entry.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Color::Blue => Color::Red,
            Color::Red => Color::Blue,
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Full health.
pub const MAX_HEALTH: f64 = 100.0;

/// State of a single connected player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,

    /// Display name, verbatim from the admission token
    pub name: String,

    /// World X
    pub x: f64,

    /// World Y
    pub y: f64,

    /// Current palette color
    pub color: Color,

    /// Health in [0, 100]
    pub health: f64,

    /// False once health hits 0
    pub alive: bool,

    /// Ticks since this player's last color flip
    #[serde(skip)]
    pub color_ticks: u32,
}

impl Player {
    /// Create a new player at a spawn position.
    pub fn new(id: PlayerId, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            color: Color::default(),
            health: MAX_HEALTH,
            alive: true,
            color_ticks: 0,
        }
    }

    /// Whether position/edge events still apply to this player.
    #[inline]
    pub fn accepts_events(&self) -> bool {
        self.alive
    }

    /// Set health, clamping to [0, 100]. Reaching 0 kills the player.
    pub fn set_health(&mut self, health: f64) {
        self.health = health.clamp(0.0, MAX_HEALTH);
        if self.health == 0.0 {
            self.alive = false;
        }
    }
}
