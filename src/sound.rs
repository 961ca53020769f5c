//! Outbound sound cues and the timed "player destroyed" sequence.

use std::time::Duration;

use crate::entities::SoundCue;

impl SoundCue {
    /// How long the cue is expected to play.  Only the death sequence
    /// depends on this; every other cue is fire-and-forget.
    pub fn nominal_length(self) -> Duration {
        match self {
            SoundCue::Blaster => Duration::from_millis(250),
            SoundCue::AsteroidBoom => Duration::from_millis(600),
            SoundCue::PlayerBoom => Duration::from_millis(1200),
            SoundCue::MissedAsteroid => Duration::from_millis(500),
            SoundCue::SavedBrokenShip => Duration::from_millis(700),
            SoundCue::LevelUp => Duration::from_millis(900),
            SoundCue::GameOver => Duration::from_millis(2500),
        }
    }
}

/// Death cue then game-over cue, strictly in order.  Driven by elapsed
/// session time so the frame loop never waits on audio.
#[derive(Clone, Debug)]
pub struct DeathSequence {
    steps: [SoundCue; 2],
    /// Index of the step currently playing; `steps.len()` once done.
    current: usize,
    step_started: Duration,
}

impl DeathSequence {
    /// Starts the sequence and returns it together with the first cue.
    pub fn start(now: Duration) -> (Self, SoundCue) {
        let seq = DeathSequence {
            steps: [SoundCue::PlayerBoom, SoundCue::GameOver],
            current: 0,
            step_started: now,
        };
        let first = seq.steps[0];
        (seq, first)
    }

    /// Emits the next cue once the current one has had time to finish.
    pub fn advance(&mut self, now: Duration) -> Option<SoundCue> {
        let playing = *self.steps.get(self.current)?;
        if now.saturating_sub(self.step_started) < playing.nominal_length() {
            return None;
        }
        self.current += 1;
        self.step_started = now;
        self.steps.get(self.current).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.steps.len()
    }
}
