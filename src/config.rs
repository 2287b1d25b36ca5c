use crate::core::{Result, ShellError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration structure parsed from a TOML file.
///
/// Every section is optional; missing values fall back to their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

/// Query session configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Query language name: "gremlin", "mql" or "sexp"
    pub language: String,
    /// Per-query time budget in seconds, honoured by the gremlin session.
    /// Zero disables the limit.
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            language: "gremlin".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Quad store configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// N-Quads file loaded into the store at startup
    pub load: Option<PathBuf>,
}

/// Logging configuration. `RUST_LOG` takes precedence when set.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = triplesh::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| ShellError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}

/// The per-user configuration file, `<config dir>/triplesh/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("triplesh").join("config.toml"))
}

/// Loads `explicit` if given, otherwise the per-user file if it exists,
/// otherwise the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(path),
        _ => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CONFIG: &str = r#"
[session]
language = "mql"
timeout_secs = 5

[store]
load = "/data/people.nq"

[log]
level = "debug"
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.session.language, "mql");
        assert_eq!(config.session.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.store.load, Some(PathBuf::from("/data/people.nq")));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[session]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.session.language, "gremlin");
        assert_eq!(config.session.timeout(), None);
        assert!(config.store.load.is_none());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = resolve_config(Some(file.path())).unwrap();
        assert_eq!(config.session.language, "mql");
    }

    #[test]
    fn test_bad_config_reports_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[session]\ntimeout_secs = \"soon\"\n").unwrap();
        match load_config(file.path()) {
            Err(ShellError::Toml(_)) => {}
            other => panic!("Expected TOML error, got {:?}", other),
        }

        match load_config("/nonexistent/triplesh.toml") {
            Err(ShellError::Config(msg)) => assert!(msg.contains("nonexistent")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}
