//! Configuration management.
//!
//! Settings come from three layers, later layers winning: built-in defaults,
//! a TOML config file, and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::repository::DbContext;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "civichub.db";

/// Default Nominatim endpoint.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Default OpenStates API endpoint.
pub const DEFAULT_OPENSTATES_URL: &str = "https://v3.openstates.org";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or config.
    pub database_url: Option<String>,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Nominatim-compatible geocoder endpoint.
    pub geocoder_url: String,
    /// OpenStates API endpoint.
    pub openstates_url: String,
    /// OpenStates API key. Set via OPENSTATES_API_KEY env var or config.
    pub openstates_api_key: Option<String>,
    /// OpenStates jurisdiction to sync, e.g. "New York".
    pub jurisdiction: String,
    /// FIPS code of the state being synced.
    pub state_fips: String,
    /// URL of the district boundary GeoJSON feed.
    pub boundaries_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/.local/share style data dir, falling back to CWD
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("civichub");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: "civichub/0.3 (civic data hub)".to_string(),
            request_timeout: 30,
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            openstates_url: DEFAULT_OPENSTATES_URL.to_string(),
            openstates_api_key: None,
            jurisdiction: "New York".to_string(),
            state_fips: "36".to_string(),
            boundaries_url: None,
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// HTTP request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    /// Create a database context from the configured URL.
    pub fn create_db_context(&self) -> anyhow::Result<DbContext> {
        Ok(DbContext::from_url(&self.database_url()))
    }
}

/// Configuration file structure. Every field is optional; unset fields keep
/// their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoder_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstates_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstates_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_fips: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries_url: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub async fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = PathBuf::from(data_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref url) = self.geocoder_url {
            settings.geocoder_url = url.clone();
        }
        if let Some(ref url) = self.openstates_url {
            settings.openstates_url = url.clone();
        }
        if let Some(ref key) = self.openstates_api_key {
            settings.openstates_api_key = Some(key.clone());
        }
        if let Some(ref jurisdiction) = self.jurisdiction {
            settings.jurisdiction = jurisdiction.clone();
        }
        if let Some(ref fips) = self.state_fips {
            settings.state_fips = fips.clone();
        }
        if let Some(ref url) = self.boundaries_url {
            settings.boundaries_url = Some(url.clone());
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Load settings: defaults, then the config file (if given or found in the
/// default data directory), then environment overrides.
pub async fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path
        .map(Path::to_path_buf)
        .or_else(|| {
            let candidate = settings.data_dir.join("civichub.toml");
            candidate.exists().then_some(candidate)
        });

    if let Some(path) = path {
        match Config::load_from_path(&path).await {
            Ok(config) => config.apply_to_settings(&mut settings),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to load config file"),
        }
    }

    if let Some(url) = env_var("DATABASE_URL") {
        tracing::debug!("Using DATABASE_URL from environment");
        settings.database_url = Some(url);
    }
    if let Some(key) = env_var("OPENSTATES_API_KEY") {
        settings.openstates_api_key = Some(key);
    }

    settings
}
