//! Error types shared by the library.

use std::path::PathBuf;

/// Leaderboard store failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("leaderboard database {} could not be opened: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("leaderboard query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),

    #[error("player name must not be empty")]
    EmptyName,

    #[error("unknown player id {0}")]
    UnknownPlayer(i64),

    #[error("only sessions with a positive score are recorded")]
    ZeroScore,
}

/// Configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {} could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
