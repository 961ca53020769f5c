use std::time::Duration;

use galactic_salvage::entities::*;
use galactic_salvage::powerup::*;

const WINDOW: Duration = Duration::from_secs(10);

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

// ── behaviour table ───────────────────────────────────────────────────────────

#[test]
fn behaviours_are_table_driven() {
    assert_eq!(
        behavior(Capability::SuperBullet),
        Behavior {
            usage: Usage::SingleUse,
            effect: Effect::WideBullet
        }
    );
    assert_eq!(
        behavior(Capability::UnlimitedBullets),
        Behavior {
            usage: Usage::Timed,
            effect: Effect::LiftBulletCeiling
        }
    );
}

// ── collect / activate ────────────────────────────────────────────────────────

#[test]
fn starts_with_nothing_held() {
    let p = PowerUps::new(WINDOW);
    for c in Capability::ALL {
        assert_eq!(p.state(c), CapabilityState::NotHeld);
    }
}

#[test]
fn collect_moves_to_held_once() {
    let mut p = PowerUps::new(WINDOW);
    assert!(p.collect(Capability::SuperBullet));
    assert_eq!(p.state(Capability::SuperBullet), CapabilityState::Held);
    assert!(!p.collect(Capability::SuperBullet));
    assert_eq!(p.state(Capability::SuperBullet), CapabilityState::Held);
}

#[test]
fn collect_while_active_changes_nothing() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::UnlimitedBullets);
    p.activate(Capability::UnlimitedBullets);
    assert!(!p.collect(Capability::UnlimitedBullets));
    assert_eq!(
        p.state(Capability::UnlimitedBullets),
        CapabilityState::Active { since: None }
    );
}

#[test]
fn activate_requires_held() {
    let mut p = PowerUps::new(WINDOW);
    assert!(!p.activate(Capability::SuperBullet));
    assert_eq!(p.state(Capability::SuperBullet), CapabilityState::NotHeld);
}

#[test]
fn activate_twice_is_a_no_op() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::UnlimitedBullets);
    assert!(p.activate(Capability::UnlimitedBullets));
    assert!(!p.activate(Capability::UnlimitedBullets));
    assert_eq!(
        p.state(Capability::UnlimitedBullets),
        CapabilityState::Active { since: None }
    );
}

// ── plan_shot: ceiling ────────────────────────────────────────────────────────

#[test]
fn standard_shot_below_ceiling() {
    let mut p = PowerUps::new(WINDOW);
    let plan = p.plan_shot(secs(0), 2, 3).unwrap();
    assert_eq!(plan.category, Category::Bullet);
    assert_eq!(plan.consumed, None);
}

#[test]
fn shot_refused_at_ceiling() {
    let mut p = PowerUps::new(WINDOW);
    assert_eq!(p.plan_shot(secs(0), 3, 3), None);
}

// ── plan_shot: super bullet ───────────────────────────────────────────────────

#[test]
fn super_bullet_is_single_use() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::SuperBullet);
    p.activate(Capability::SuperBullet);

    let plan = p.plan_shot(secs(2), 0, 3).unwrap();
    assert_eq!(plan.category, Category::SuperBullet);
    assert_eq!(plan.consumed, Some(Capability::SuperBullet));
    assert_eq!(p.state(Capability::SuperBullet), CapabilityState::NotHeld);

    let next = p.plan_shot(secs(3), 1, 3).unwrap();
    assert_eq!(next.category, Category::Bullet);
}

#[test]
fn held_but_inactive_super_bullet_does_not_fire() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::SuperBullet);
    let plan = p.plan_shot(secs(0), 0, 3).unwrap();
    assert_eq!(plan.category, Category::Bullet);
    assert_eq!(p.state(Capability::SuperBullet), CapabilityState::Held);
}

#[test]
fn refused_shot_keeps_super_bullet_active() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::SuperBullet);
    p.activate(Capability::SuperBullet);
    assert_eq!(p.plan_shot(secs(1), 3, 3), None);
    assert!(p.is_active(Capability::SuperBullet));
}

// ── plan_shot: unlimited bullets ──────────────────────────────────────────────

#[test]
fn unlimited_lifts_the_ceiling_inside_the_window() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::UnlimitedBullets);
    p.activate(Capability::UnlimitedBullets);
    assert_eq!(p.bullet_ceiling(3), None);

    let plan = p.plan_shot(secs(5), 10, 3).unwrap();
    assert_eq!(plan.category, Category::Bullet);
    assert!(p.is_active(Capability::UnlimitedBullets));
}

#[test]
fn unlimited_window_opens_on_the_first_shot() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::UnlimitedBullets);
    p.activate(Capability::UnlimitedBullets);

    // Waiting after activation spends none of the window
    let plan = p.plan_shot(secs(30), 3, 3).unwrap();
    assert_eq!(plan.category, Category::Bullet);
    assert_eq!(
        p.state(Capability::UnlimitedBullets),
        CapabilityState::Active { since: Some(secs(30)) }
    );

    assert!(p.plan_shot(secs(39), 10, 3).is_some());
    assert_eq!(p.plan_shot(secs(40), 10, 3), None);
    assert_eq!(p.state(Capability::UnlimitedBullets), CapabilityState::NotHeld);
}

#[test]
fn unlimited_expires_lazily_on_fire() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::UnlimitedBullets);
    p.activate(Capability::UnlimitedBullets);
    assert!(p.plan_shot(secs(0), 0, 3).is_some());

    // Time alone does not expire it
    assert!(p.is_active(Capability::UnlimitedBullets));

    // The first fire attempt past the window expires it, then the normal
    // ceiling applies to that same attempt.
    assert_eq!(p.plan_shot(secs(10), 10, 3), None);
    assert_eq!(p.state(Capability::UnlimitedBullets), CapabilityState::NotHeld);
    assert_eq!(p.bullet_ceiling(3), Some(3));
}

#[test]
fn expired_unlimited_shot_below_ceiling_still_fires() {
    let mut p = PowerUps::new(WINDOW);
    p.collect(Capability::UnlimitedBullets);
    p.activate(Capability::UnlimitedBullets);
    p.plan_shot(secs(0), 0, 3).unwrap();
    let plan = p.plan_shot(secs(30), 1, 3).unwrap();
    assert_eq!(plan.category, Category::Bullet);
    assert!(!p.is_held(Capability::UnlimitedBullets));
}

#[test]
fn on_fire_reports_effects() {
    let mut p = PowerUps::new(WINDOW);
    assert_eq!(p.on_fire(Capability::UnlimitedBullets, secs(0)), FireEffect::Inactive);
    p.collect(Capability::UnlimitedBullets);
    p.activate(Capability::UnlimitedBullets);
    // The first attempt opens the window
    assert_eq!(p.on_fire(Capability::UnlimitedBullets, secs(9)), FireEffect::Applied);
    assert_eq!(p.on_fire(Capability::UnlimitedBullets, secs(18)), FireEffect::Applied);
    assert_eq!(p.on_fire(Capability::UnlimitedBullets, secs(19)), FireEffect::TimedOut);

    p.collect(Capability::SuperBullet);
    p.activate(Capability::SuperBullet);
    assert_eq!(p.on_fire(Capability::SuperBullet, secs(11)), FireEffect::Consumed);
}

#[test]
fn both_active_gives_wide_shot_past_the_ceiling() {
    let mut p = PowerUps::new(WINDOW);
    for c in Capability::ALL {
        p.collect(c);
        p.activate(c);
    }
    let plan = p.plan_shot(secs(1), 8, 3).unwrap();
    assert_eq!(plan.category, Category::SuperBullet);
    assert!(p.is_active(Capability::UnlimitedBullets));
}
