use std::path::Path;

use galactic_salvage::config::*;
use galactic_salvage::error::ConfigError;

#[test]
fn defaults_match_the_arcade_tuning() {
    let c = GameConfig::default();
    assert_eq!((c.screen_width, c.screen_height), (800, 600));
    assert_eq!(c.starting_lives, 3);
    assert_eq!(c.bullets_allowed, 3);
    assert_eq!(c.unlimited_bullets_secs, 10);
    assert_eq!(c.scoring.player_hit_penalty, 5);
    assert_eq!(c.scoring.salvage_reward, 10);
    assert_eq!(c.odds.broken_ship, 2000);
    assert!(c.validate().is_ok());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let text = r#"
        starting_lives = 5
        ignore_speed_cap = true

        [scoring]
        points_per_level = 20
    "#;
    let c = GameConfig::from_toml_str(text, Path::new("test.toml")).unwrap();
    assert_eq!(c.starting_lives, 5);
    assert!(c.ignore_speed_cap);
    assert_eq!(c.scoring.points_per_level, 20);
    assert_eq!(c.scoring.player_hit_penalty, 5);
    assert_eq!(c.screen_width, 800);
}

#[test]
fn empty_toml_is_default() {
    let c = GameConfig::from_toml_str("", Path::new("empty.toml")).unwrap();
    assert_eq!(c, GameConfig::default());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = GameConfig::from_toml_str("starting_lives = \"many\"", Path::new("bad.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn zero_bullets_is_rejected() {
    let err = GameConfig::from_toml_str("bullets_allowed = 0", Path::new("x.toml")).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "bullets_allowed",
            ..
        }
    ));
}

#[test]
fn inverted_speed_range_is_rejected() {
    let c = GameConfig {
        asteroid_speed_min: 4,
        asteroid_speed_max: 2,
        ..GameConfig::default()
    };
    assert!(c.validate().is_err());
}

#[test]
fn load_missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GameConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.toml");
    std::fs::write(&path, "frame_rate = 30\n").unwrap();
    let c = GameConfig::load(&path).unwrap();
    assert_eq!(c.frame_rate, 30);
}
