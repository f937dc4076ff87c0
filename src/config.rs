use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_INTERVAL_SECS: u64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote address book configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the address book server (e.g., "https://dav.example.com/addressbooks/alice")
    pub server_url: Option<String>,
    /// Username for HTTP basic auth
    pub username: Option<String>,
    /// Password for HTTP basic auth
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Address books to fetch, relative to `server_url`
    pub address_books: Vec<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            username: None,
            password: None,
            address_books: vec!["contacts".to_string()],
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite contact store
    pub database_path: ConfigValue<PathBuf>,
    /// Seconds between runs in daemon mode
    pub interval_secs: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Remote address book
    pub source: SourceConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    interval_secs: Option<u64>,
    source: Option<SourceConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("contacts.db"),
            ConfigSource::Default,
        );
        let mut interval_secs = ConfigValue::new(DEFAULT_INTERVAL_SECS, ConfigSource::Default);
        let mut config_file = None;
        let mut source = SourceConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(secs) = file_config.interval_secs {
                interval_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(source_config) = file_config.source {
                source = source_config;
            }
        }

        if let Ok(db_path) = std::env::var("CONTACTSYNC_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(secs) = std::env::var("CONTACTSYNC_INTERVAL_SECS") {
            let secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "CONTACTSYNC_INTERVAL_SECS",
                value: secs.clone(),
            })?;
            interval_secs = ConfigValue::new(secs, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("CONTACTSYNC_SERVER_URL") {
            source.server_url = Some(url);
        }
        if let Ok(user) = std::env::var("CONTACTSYNC_USERNAME") {
            source.username = Some(user);
        }
        if let Ok(password) = std::env::var("CONTACTSYNC_PASSWORD") {
            source.password = Some(password);
        }

        if interval_secs.value == 0 {
            return Err(ConfigError::InvalidValue {
                key: "interval_secs",
                value: "0".to_string(),
            });
        }
        if source.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "source.timeout_secs",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_path,
            interval_secs,
            config_file,
            source,
        })
    }

    /// Lock file shared by every process syncing into the same database
    pub fn run_lock_path(&self) -> PathBuf {
        self.database_path.value.with_extension("lock")
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/contactsync/
    /// - macOS: ~/Library/Application Support/contactsync/
    /// - Windows: %APPDATA%/contactsync/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contactsync")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/contactsync/
    /// - macOS: ~/Library/Application Support/contactsync/
    /// - Windows: %APPDATA%/contactsync/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contactsync")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config
            .database_path
            .value
            .to_string_lossy()
            .contains("contacts.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.interval_secs.value, 300);
        assert_eq!(config.interval_secs.source, ConfigSource::Default);
        assert_eq!(config.source.address_books, vec!["contacts"]);
        assert_eq!(config.source.timeout_secs, 30);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/contacts.sqlite").unwrap();
        writeln!(file, "interval_secs: 60").unwrap();
        writeln!(file, "source:").unwrap();
        writeln!(file, "  server_url: https://dav.example.com/addressbooks/alice").unwrap();
        writeln!(file, "  username: alice").unwrap();
        writeln!(file, "  address_books: [family, work]").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/contacts.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.interval_secs.value, 60);
        assert_eq!(config.interval_secs.source, ConfigSource::File);
        assert_eq!(
            config.source.server_url.as_deref(),
            Some("https://dav.example.com/addressbooks/alice")
        );
        assert_eq!(config.source.username.as_deref(), Some("alice"));
        assert_eq!(config.source.address_books, vec!["family", "work"]);
        // Unset fields inside the section fall back to defaults
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_run_lock_path_sits_next_to_database() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /var/lib/contactsync/contacts.db").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.run_lock_path(),
            PathBuf::from("/var/lib/contactsync/contacts.lock")
        );
    }

    #[test]
    fn test_relative_database_path_resolved_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: data/contacts.db").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.database_path.value,
            temp_dir.path().join("data/contacts.db")
        );
    }

    #[test]
    fn test_password_not_serialized() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "source:").unwrap();
        writeln!(file, "  server_url: https://dav.example.com").unwrap();
        writeln!(file, "  password: hunter2").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.source.password.as_deref(), Some("hunter2"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "interval_secs: 0").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "source:").unwrap();
        writeln!(file, "  server_url: https://dav.example.com").unwrap();
        writeln!(file, "  timeout_secs: 0").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "source.timeout_secs",
                ..
            }
        ));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "interval_secs: 60").unwrap();

        std::env::set_var("CONTACTSYNC_INTERVAL_SECS", "15");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.interval_secs.value, 15);
        assert_eq!(config.interval_secs.source, ConfigSource::Environment);

        std::env::remove_var("CONTACTSYNC_INTERVAL_SECS");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
