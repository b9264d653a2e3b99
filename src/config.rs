// Bot configuration.
// Loads californias.toml from the working directory, then applies environment overrides over defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::{OnCorruption, default_cache_dir};
use crate::counties::nominatim::NOMINATIM_SEARCH_URL;
use crate::error::{BotError, Result};
use crate::mastodon::ClientCredentials;
use crate::region::ADJACENCY_EPSILON;

pub const CONFIG_FILENAME: &str = "californias.toml";

/// Default location of the registered app's client id and secret.
pub const CLIENT_CRED_SECRET_FILENAME: &str = "pytooter_clientcred.secret";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub mastodon: MastodonConfig,
    pub cache: CacheConfig,
    pub geodata: GeodataConfig,
    pub map: MapConfig,
}

/// Account used to publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MastodonConfig {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Text file holding the client id and secret, one per line.
    pub client_credentials: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Defaults to the platform cache directory.
    pub dir: Option<PathBuf>,
    /// Rebuild unreadable cache files instead of failing.
    pub recompute_on_corruption: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeodataConfig {
    pub endpoint: String,
    /// Pause between lookups; the public Nominatim instance allows one per second.
    pub request_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Neighbor threshold in lon/lat degrees; see [`ADJACENCY_EPSILON`].
    pub adjacency_epsilon: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            server: None,
            username: None,
            password: None,
            client_credentials: PathBuf::from(CLIENT_CRED_SECRET_FILENAME),
        }
    }
}

impl Default for GeodataConfig {
    fn default() -> Self {
        Self {
            endpoint: NOMINATIM_SEARCH_URL.to_string(),
            request_interval_ms: 1000,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            adjacency_epsilon: ADJACENCY_EPSILON,
            width: 800,
            height: 900,
        }
    }
}

/// Everything needed to log in and post, validated up front.
#[derive(Debug, Clone)]
pub struct PostingCredentials {
    pub server: String,
    pub username: String,
    pub password: String,
    pub client: ClientCredentials,
}

/// Overwrite `target` with a non-empty variable value.
fn string_override(value: Option<String>, target: &mut Option<String>) {
    if let Some(v) = value
        && !v.is_empty()
    {
        *target = Some(v);
    }
}

impl BotConfig {
    /// Load config from `californias.toml` in `dir`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut config = if config_path.is_file() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|var| std::env::var(var).ok());
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        string_override(lookup("MASTODON_SERVER"), &mut self.mastodon.server);
        string_override(lookup("MASTODON_USERNAME"), &mut self.mastodon.username);
        string_override(lookup("MASTODON_PASSWORD"), &mut self.mastodon.password);

        if let Some(dir) = lookup("CALIFORNIAS_CACHE_DIR").filter(|d| !d.is_empty()) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }

    /// Directory holding cached geometry and the uploaded map.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .or_else(default_cache_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn corruption_policy(&self) -> OnCorruption {
        if self.cache.recompute_on_corruption {
            OnCorruption::Recompute
        } else {
            OnCorruption::Fail
        }
    }

    /// Check posting preconditions in order: credential file, server, username, password.
    pub fn posting_credentials(&self) -> Result<PostingCredentials> {
        let client = ClientCredentials::from_file(&self.mastodon.client_credentials)?;
        let server = self.mastodon.server.clone().ok_or(BotError::MissingServer)?;
        let username = self
            .mastodon
            .username
            .clone()
            .ok_or(BotError::MissingUsername)?;
        let password = self
            .mastodon
            .password
            .clone()
            .ok_or(BotError::MissingPassword)?;

        Ok(PostingCredentials {
            server,
            username,
            password,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = BotConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.map.width, 800);
        assert_eq!(config.geodata.endpoint, NOMINATIM_SEARCH_URL);
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.map.adjacency_epsilon, 0.001);
        assert_eq!(config.geodata.request_interval_ms, 1000);
        assert_eq!(
            config.mastodon.client_credentials,
            PathBuf::from("pytooter_clientcred.secret")
        );
        assert_eq!(config.corruption_policy(), OnCorruption::Fail);
    }

    #[test]
    fn test_load_toml_with_partial_sections() {
        let toml_str = r#"
[mastodon]
server = "https://botsin.space"

[cache]
dir = "/var/cache/californias"
recompute_on_corruption = true

[map]
width = 1200
"#;

        let mut config: BotConfig = toml::from_str(toml_str).unwrap();
        config.apply_overrides(lookup_from(&[]));

        assert_eq!(config.mastodon.server.as_deref(), Some("https://botsin.space"));
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/californias"));
        assert_eq!(config.corruption_policy(), OnCorruption::Recompute);
        assert_eq!(config.map.width, 1200);
        assert_eq!(config.map.height, 900);
        assert_eq!(config.map.adjacency_epsilon, ADJACENCY_EPSILON);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BotConfig::default();
        config.mastodon.server = Some("https://old.example".to_string());

        config.apply_overrides(lookup_from(&[
            ("MASTODON_SERVER", "https://botsin.space"),
            ("MASTODON_USERNAME", "bot@example.com"),
            ("MASTODON_PASSWORD", ""),
            ("CALIFORNIAS_CACHE_DIR", "/tmp/ca"),
        ]));

        assert_eq!(config.mastodon.server.as_deref(), Some("https://botsin.space"));
        assert_eq!(config.mastodon.username.as_deref(), Some("bot@example.com"));
        assert!(config.mastodon.password.is_none());
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/ca"));
    }

    #[test]
    fn test_posting_preconditions_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let cred_path = temp_dir.path().join(CLIENT_CRED_SECRET_FILENAME);

        let mut config = BotConfig::default();
        config.mastodon.client_credentials = cred_path.clone();
        config.mastodon.server = Some("https://botsin.space".to_string());
        config.mastodon.username = Some("bot".to_string());
        config.mastodon.password = Some("hunter2".to_string());

        // Credential file is checked first even when everything else is set.
        assert!(matches!(
            config.posting_credentials(),
            Err(BotError::MissingClientCredentials(_))
        ));

        std::fs::write(&cred_path, "id\nsecret\n").unwrap();
        config.mastodon.server = None;
        config.mastodon.username = None;
        assert!(matches!(
            config.posting_credentials(),
            Err(BotError::MissingServer)
        ));

        config.mastodon.server = Some("https://botsin.space".to_string());
        assert!(matches!(
            config.posting_credentials(),
            Err(BotError::MissingUsername)
        ));

        config.mastodon.username = Some("bot".to_string());
        config.mastodon.password = None;
        assert!(matches!(
            config.posting_credentials(),
            Err(BotError::MissingPassword)
        ));

        config.mastodon.password = Some("hunter2".to_string());
        let creds = config.posting_credentials().unwrap();
        assert_eq!(creds.client.client_secret, "secret");
        assert_eq!(creds.username, "bot");
    }
}
