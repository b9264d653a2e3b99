// Mastodon API types.
// Client credentials, OAuth token, media, and status payloads.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Registered application credentials.
///
/// Stored as text: client id on the first line, client secret on the second.
/// Any further lines (such as the server URL) are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn parse(contents: &str) -> Option<Self> {
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
        let client_id = lines.next()?.to_string();
        let client_secret = lines.next()?.to_string();
        Some(Self {
            client_id,
            client_secret,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BotError::MissingClientCredentials(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents).ok_or_else(|| BotError::MalformedClientCredentials {
            path: path.to_path_buf(),
            reason: "expected client id and client secret on separate lines".to_string(),
        })
    }
}

/// OAuth token grant response.
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub access_token: String,
}

/// Uploaded media attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// A published status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub url: Option<String>,
    pub content: String,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
}

/// Image bytes to attach to a post.
#[derive(Debug, Clone)]
pub struct Media {
    pub buf: Vec<u8>,
    pub mime_type: String,
    pub description: String,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: Option<DateTime<Utc>>,
}
