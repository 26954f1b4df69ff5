//! Configuration management for depot-ledger using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::escalation::{standard_questions, ChecklistQuestion};
use crate::repository::DbContext;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "depot-ledger.db";

/// Manual "refresh all" cooldown for tracking lookups.
pub const DEFAULT_REFRESH_COOLDOWN_SECS: u64 = 30;

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
    /// Base URL of the carrier tracking service. Tracking is disabled when unset.
    pub tracking_base_url: Option<String>,
    /// Tracking request timeout in seconds.
    pub tracking_timeout: u64,
    /// Cooldown between manual tracking refreshes, in seconds.
    pub refresh_cooldown: u64,
    /// Carrier used for clients without their own tracking carrier.
    pub default_carrier: String,
    /// Escalation checklist questions.
    pub checklist_questions: Vec<ChecklistQuestion>,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/depot-ledger/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depot-ledger");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            tracking_base_url: None,
            tracking_timeout: 10,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN_SECS,
            default_carrier: "royal_mail".to_string(),
            checklist_questions: standard_questions(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_url.is_some() || self.database_path().exists()
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    pub fn tracking_timeout(&self) -> Duration {
        Duration::from_secs(self.tracking_timeout)
    }

    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_secs(self.refresh_cooldown)
    }
}

/// Tracking section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Manual refresh cooldown in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_cooldown: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_carrier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Replaces the standard checklist when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<ChecklistQuestion>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers depot-ledger config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("depot-ledger").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}; using defaults", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.tracking.base_url {
            settings.tracking_base_url = Some(url.clone()).filter(|u| !u.trim().is_empty());
        }
        if let Some(timeout) = self.tracking.timeout {
            settings.tracking_timeout = timeout;
        }
        if let Some(cooldown) = self.tracking.refresh_cooldown {
            settings.refresh_cooldown = cooldown;
        }
        if let Some(ref carrier) = self.tracking.default_carrier {
            settings.default_carrier = carrier.clone();
        }
        if !self.escalation.questions.is_empty() {
            settings.checklist_questions = self.escalation.questions.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths from the working directory instead of the
    /// config file location.
    pub use_cwd: bool,
    /// Data directory or database file (--target flag).
    pub target: Option<PathBuf>,
}

/// Resolve a target path to (data_dir, database_filename).
/// A path with a database extension names the file; anything else is a directory.
fn resolve_target(path: &Path) -> (PathBuf, Option<String>) {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let is_db_file = path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");
    if is_db_file {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (dir, filename)
    } else {
        (path, None)
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    // Priority: explicit --config flag, then prefer discovery
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await.unwrap_or_else(|e| {
            tracing::warn!("{}; using defaults", e);
            Config::default()
        }),
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };
    config.apply_to_settings(&mut settings, &base_dir);

    // --target takes precedence over the config file
    if let Some(ref target) = options.target {
        let (dir, filename) = resolve_target(target);
        settings.data_dir = dir;
        if let Some(filename) = filename {
            settings.database_filename = filename;
        }
    }

    // DATABASE_URL environment variable takes highest precedence
    if let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml_and_apply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depot-ledger.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "./data"

[tracking]
base_url = "https://tracking.example.test"
refresh_cooldown = 5

[[escalation.questions]]
prompt = "Cages checked?"
alert = "Check the cages."
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.data_dir, dir.path().join("./data"));
        assert_eq!(
            settings.tracking_base_url.as_deref(),
            Some("https://tracking.example.test")
        );
        assert_eq!(settings.refresh_cooldown(), Duration::from_secs(5));
        assert_eq!(settings.tracking_timeout(), Duration::from_secs(10));
        assert_eq!(settings.checklist_questions.len(), 1);
    }

    #[tokio::test]
    async fn test_yaml_and_json_are_parsed_by_extension() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "database: other.db\ntracking:\n  default_carrier: evri\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.database.as_deref(), Some("other.db"));
        assert_eq!(config.tracking.default_carrier.as_deref(), Some("evri"));

        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"{"target": "/srv/depot"}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.data_dir.as_deref(), Some("/srv/depot"));

        let broken = dir.path().join("c.toml");
        std::fs::write(&broken, "not = [valid").unwrap();
        assert!(Config::load_from_path(&broken).await.is_err());
    }

    #[test]
    fn test_empty_question_override_keeps_standard_list() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/tmp/depot"));
        Config::default().apply_to_settings(&mut settings, Path::new("/"));
        assert_eq!(settings.checklist_questions, standard_questions());
        assert_eq!(
            settings.database_url(),
            "sqlite:/tmp/depot/depot-ledger.db"
        );
    }

    #[test]
    fn test_target_resolution() {
        let (dir, file) = resolve_target(Path::new("/srv/depot/ledger.db"));
        assert_eq!(dir, PathBuf::from("/srv/depot"));
        assert_eq!(file.as_deref(), Some("ledger.db"));

        let (dir, file) = resolve_target(Path::new("/srv/depot"));
        assert_eq!(dir, PathBuf::from("/srv/depot"));
        assert!(file.is_none());
    }
}
