//! Galactic Salvage: the game-session core of a falling-asteroid shooter.
//!
//! The library holds everything that has rules: the entity arena, collision
//! resolution, scoring and levels, power-up capabilities and the leaderboard
//! store.  The binary in `main.rs` supplies the terminal, the clock and the
//! keyboard.

pub mod collision;
pub mod config;
pub mod difficulty;
pub mod entities;
pub mod error;
pub mod persistence;
pub mod powerup;
pub mod registry;
pub mod score;
pub mod session;
pub mod sound;
