//! All game entity types: pure data, next to no logic.

use std::fmt;
use std::time::Duration;

// ── Identity & geometry ───────────────────────────────────────────────────────

/// Opaque identity handed out by the registry.  Never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned bounding box in playfield pixels.  `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    /// Strict overlap: rectangles that merely share an edge do not collide.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

// ── Categories & payloads ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Asteroid,
    Bullet,
    SuperBullet,
    BrokenShip,
    ExtraLife,
    SuperBulletPickup,
    UnlimitedBulletsPickup,
    Star,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Asteroid,
        Category::Bullet,
        Category::SuperBullet,
        Category::BrokenShip,
        Category::ExtraLife,
        Category::SuperBulletPickup,
        Category::UnlimitedBulletsPickup,
        Category::Star,
    ];

    pub fn is_bullet(self) -> bool {
        matches!(self, Category::Bullet | Category::SuperBullet)
    }

    /// Things the player can fly into and collect.
    pub fn is_pickup(self) -> bool {
        matches!(
            self,
            Category::BrokenShip
                | Category::ExtraLife
                | Category::SuperBulletPickup
                | Category::UnlimitedBulletsPickup
        )
    }

    /// The capability granted by collecting this pickup, if any.
    pub fn grants(self) -> Option<Capability> {
        match self {
            Category::SuperBulletPickup => Some(Capability::SuperBullet),
            Category::UnlimitedBulletsPickup => Some(Capability::UnlimitedBullets),
            _ => None,
        }
    }
}

/// Vertical speed (pixels per nominal frame, positive = falling) and an
/// optional spin in degrees per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub dy: f32,
    pub rotation: f32,
}

impl Velocity {
    pub fn falling(dy: f32) -> Self {
        Velocity { dy, rotation: 0.0 }
    }
}

/// Category-specific extras.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Asteroid {
        /// Spin in degrees, advanced by `Velocity::rotation`.
        angle: f32,
    },
    Bullet {
        /// Spans the whole playfield width and scores for the group.
        wide: bool,
    },
    Pickup {
        caption: Option<&'static str>,
    },
    Star,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub category: Category,
    pub rect: Rect,
    pub velocity: Velocity,
    pub payload: Payload,
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub rect: Rect,
    pub moving_left: bool,
    pub moving_right: bool,
    pub lives: u32,
}

impl Player {
    pub const WIDTH: f32 = 40.0;
    pub const HEIGHT: f32 = 48.0;

    /// A fresh ship parked at its spawn anchor (bottom centre).
    pub fn new(lives: u32, screen_width: f32, screen_height: f32) -> Self {
        let mut player = Player {
            rect: Rect::new(0.0, 0.0, Self::WIDTH, Self::HEIGHT),
            moving_left: false,
            moving_right: false,
            lives,
        };
        player.recenter(screen_width, screen_height);
        player
    }

    pub fn recenter(&mut self, screen_width: f32, screen_height: f32) {
        self.rect.x = (screen_width - self.rect.w) / 2.0;
        self.rect.y = screen_height - self.rect.h;
    }

    /// Apply the held movement flags.  `step` is the distance for this tick.
    pub fn steer(&mut self, step: f32, screen_width: f32) {
        if self.moving_right && self.rect.right() < screen_width {
            self.rect.x += step;
        }
        if self.moving_left && self.rect.x > 0.0 {
            self.rect.x -= step;
        }
        self.rect.x = self.rect.x.clamp(0.0, (screen_width - self.rect.w).max(0.0));
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Single-use screen-wide bullet.
    SuperBullet,
    /// Lifts the bullet ceiling for a fixed time window.
    UnlimitedBullets,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::SuperBullet, Capability::UnlimitedBullets];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityState {
    NotHeld,
    Held,
    /// `since` is the session time of the first shot fired while Active;
    /// `None` until then.
    Active { since: Option<Duration> },
    Expired,
}

// ── Sound cues ────────────────────────────────────────────────────────────────

/// Identifiers the audio collaborator maps to playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Blaster,
    AsteroidBoom,
    PlayerBoom,
    MissedAsteroid,
    SavedBrokenShip,
    LevelUp,
    GameOver,
}

// ── Input & status ────────────────────────────────────────────────────────────

/// One frame of already-decoded input.  Movement flags are "held"; the
/// rest are edges that fire once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub move_left: bool,
    pub move_right: bool,
    pub fire: bool,
    pub activate_super_bullet: bool,
    pub activate_unlimited_bullets: bool,
    pub toggle_mute: bool,
    pub toggle_fullscreen: bool,
    pub quit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Playing,
    /// Lives ran out; the death cue sequence is still playing.
    Dying,
    Over,
}
