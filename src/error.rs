// Error types for the californias bot.
// Covers configuration preconditions, geodata and Mastodon API failures, cache and partition errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Error: {} does not exist, create the Mastodon app and save its client credentials there first", .0.display())]
    MissingClientCredentials(PathBuf),

    #[error("Error: Set the environment variable MASTODON_SERVER to the URL of the Mastodon server")]
    MissingServer,

    #[error("Error: Set the environment variable MASTODON_USERNAME to your username or email")]
    MissingUsername,

    #[error("Error: Set the environment variable MASTODON_PASSWORD to your password")]
    MissingPassword,

    #[error("Malformed client credentials file {}: {reason}", .path.display())]
    MalformedClientCredentials { path: PathBuf, reason: String },

    #[error("HTTP error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Rate limited by the Mastodon server until {reset_at}")]
    RateLimited { reset_at: String },

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("No polygon found for {0}")]
    GeodataMiss(String),

    #[error("Cache file {} is unreadable ({reason}); delete it to rebuild", .path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("Cannot partition into {requested} regions")]
    InvalidRegionCount { requested: usize },

    #[error("Invalid seed county {index} for a graph of {county_count} counties")]
    InvalidSeed { index: usize, county_count: usize },

    #[error("Partition stalled with {unassigned} counties unreachable from every region")]
    PartitionStalled { unassigned: usize },

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Whether this error is a configuration precondition checked before any work starts.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BotError::MissingClientCredentials(_)
                | BotError::MissingServer
                | BotError::MissingUsername
                | BotError::MissingPassword
        )
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
