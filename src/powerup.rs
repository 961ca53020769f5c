//! Power-up capability tracking.
//!
//! Each capability walks `NotHeld -> Held -> Active -> Expired -> NotHeld`.
//! What a capability does is looked up in a small table rather than
//! inferred from the pickup that granted it.

use std::time::Duration;

use crate::entities::{Capability, CapabilityState, Category};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Usage {
    /// Consumed by the first shot fired while Active.
    SingleUse,
    /// Active for a fixed window, checked lazily on each fire attempt.
    Timed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Shots become screen-wide super bullets.
    WideBullet,
    /// The bullets-in-flight ceiling is lifted.
    LiftBulletCeiling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Behavior {
    pub usage: Usage,
    pub effect: Effect,
}

const BEHAVIORS: [(Capability, Behavior); 2] = [
    (
        Capability::SuperBullet,
        Behavior {
            usage: Usage::SingleUse,
            effect: Effect::WideBullet,
        },
    ),
    (
        Capability::UnlimitedBullets,
        Behavior {
            usage: Usage::Timed,
            effect: Effect::LiftBulletCeiling,
        },
    ),
];

pub fn behavior(capability: Capability) -> Behavior {
    BEHAVIORS[slot(capability)].1
}

fn slot(capability: Capability) -> usize {
    match capability {
        Capability::SuperBullet => 0,
        Capability::UnlimitedBullets => 1,
    }
}

/// Result of offering a fire attempt to one capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireEffect {
    /// Not Active; the shot is unaffected.
    Inactive,
    /// Active and still in force for this shot.
    Applied,
    /// Single-use capability spent on this shot.
    Consumed,
    /// Timed capability ran out; this shot is back to normal.
    TimedOut,
}

/// What a permitted shot should be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotPlan {
    pub category: Category,
    pub consumed: Option<Capability>,
}

#[derive(Clone, Debug)]
pub struct PowerUps {
    states: [CapabilityState; 2],
    window: Duration,
}

impl PowerUps {
    /// `window` is how long a timed capability stays in force.
    pub fn new(window: Duration) -> Self {
        PowerUps {
            states: [CapabilityState::NotHeld; 2],
            window,
        }
    }

    pub fn state(&self, capability: Capability) -> CapabilityState {
        self.states[slot(capability)]
    }

    /// Held or Active.
    pub fn is_held(&self, capability: Capability) -> bool {
        matches!(
            self.state(capability),
            CapabilityState::Held | CapabilityState::Active { .. }
        )
    }

    pub fn is_active(&self, capability: Capability) -> bool {
        matches!(self.state(capability), CapabilityState::Active { .. })
    }

    fn transition(&mut self, capability: Capability, to: CapabilityState) {
        let from = std::mem::replace(&mut self.states[slot(capability)], to);
        tracing::debug!(?capability, ?from, ?to, "capability transition");
    }

    fn expire(&mut self, capability: Capability) {
        self.transition(capability, CapabilityState::Expired);
        self.transition(capability, CapabilityState::NotHeld);
    }

    /// Pickup collected.  Returns false (and changes nothing) when the
    /// capability is already Held or Active.
    pub fn collect(&mut self, capability: Capability) -> bool {
        if self.is_held(capability) {
            return false;
        }
        self.transition(capability, CapabilityState::Held);
        true
    }

    /// Player asked to switch a capability on.  No-op unless Held.  A timed
    /// capability's window opens with the first shot, not here.
    pub fn activate(&mut self, capability: Capability) -> bool {
        if self.state(capability) != CapabilityState::Held {
            return false;
        }
        self.transition(capability, CapabilityState::Active { since: None });
        true
    }

    /// Offer a fire attempt to `capability`.  Timed capabilities start their
    /// window on the first attempt and are only ever expired here, never by
    /// the passage of time alone.
    pub fn on_fire(&mut self, capability: Capability, now: Duration) -> FireEffect {
        let CapabilityState::Active { since } = self.state(capability) else {
            return FireEffect::Inactive;
        };
        match behavior(capability).usage {
            Usage::SingleUse => {
                self.expire(capability);
                FireEffect::Consumed
            }
            Usage::Timed => match since {
                None => {
                    self.transition(capability, CapabilityState::Active { since: Some(now) });
                    FireEffect::Applied
                }
                Some(since) if now.saturating_sub(since) >= self.window => {
                    self.expire(capability);
                    FireEffect::TimedOut
                }
                Some(_) => FireEffect::Applied,
            },
        }
    }

    /// Current bullets-in-flight ceiling; `None` means no ceiling.
    pub fn bullet_ceiling(&self, default: u32) -> Option<u32> {
        let lifted = Capability::ALL.iter().any(|&c| {
            self.is_active(c) && behavior(c).effect == Effect::LiftBulletCeiling
        });
        (!lifted).then_some(default)
    }

    /// Decide a fire attempt: expire timed capabilities first, then apply
    /// the ceiling, then pick the bullet kind.  `None` means the shot is
    /// refused because too many bullets are already in flight.
    pub fn plan_shot(&mut self, now: Duration, in_flight: usize, default_ceiling: u32) -> Option<ShotPlan> {
        for capability in Capability::ALL {
            if behavior(capability).usage == Usage::Timed {
                self.on_fire(capability, now);
            }
        }

        if let Some(ceiling) = self.bullet_ceiling(default_ceiling) {
            if in_flight >= ceiling as usize {
                return None;
            }
        }

        let wide = Capability::ALL.into_iter().find(|&c| {
            self.is_active(c) && behavior(c).effect == Effect::WideBullet
        });
        match wide {
            Some(capability) => {
                self.on_fire(capability, now);
                Some(ShotPlan {
                    category: Category::SuperBullet,
                    consumed: Some(capability),
                })
            }
            None => Some(ShotPlan {
                category: Category::Bullet,
                consumed: None,
            }),
        }
    }
}
