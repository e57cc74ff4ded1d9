//! Process configuration from environment variables.
//!
//! # Responsibility
//! - Collect taxonomy, database and logging settings in one value.
//! - Map settings to the concrete source and storage target.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - `log_level` is always a canonical level name.
//! - `log_dir`, when set, is absolute.

use crate::db::DbTarget;
use crate::logging::{default_log_level, normalize_level, LoggingError};
use crate::taxonomy::{BuiltinSnapshotSource, FileSnapshotSource, TaxonomySource};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_TAXONOMY_PATH: &str = "NNA_TAXONOMY_PATH";
pub const ENV_DB_PATH: &str = "NNA_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "NNA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "NNA_LOG_DIR";

/// Invalid configuration value.
#[derive(Debug)]
pub enum ConfigError {
    LogLevel {
        variable: &'static str,
        source: LoggingError,
    },
    RelativeLogDir {
        variable: &'static str,
        path: PathBuf,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LogLevel { variable, source } => write!(f, "{variable}: {source}"),
            Self::RelativeLogDir { variable, path } => write!(
                f,
                "{variable}: log directory `{}` must be absolute",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LogLevel { source, .. } => Some(source),
            Self::RelativeLogDir { .. } => None,
        }
    }
}

/// Registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Snapshot JSON file; the bundled snapshot when `None`.
    pub taxonomy_path: Option<PathBuf>,
    /// Counter database; in-memory counters when `None`.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// File logging is off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            taxonomy_path: None,
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl RegistryConfig {
    /// Reads `NNA_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(|source| ConfigError::LogLevel {
                variable: ENV_LOG_LEVEL,
                source,
            })?,
            None => default_log_level(),
        };
        let log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(dir) = log_dir.as_ref().filter(|dir| !dir.is_absolute()) {
            return Err(ConfigError::RelativeLogDir {
                variable: ENV_LOG_DIR,
                path: dir.clone(),
            });
        }

        Ok(Self {
            taxonomy_path: read(ENV_TAXONOMY_PATH).map(PathBuf::from),
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level,
            log_dir,
        })
    }

    /// Snapshot source selected by `taxonomy_path`.
    pub fn taxonomy_source(&self) -> Box<dyn TaxonomySource> {
        match &self.taxonomy_path {
            Some(path) => Box::new(FileSnapshotSource::new(path)),
            None => Box::new(BuiltinSnapshotSource),
        }
    }

    /// Durable counter store, if one is configured.
    pub fn db_target(&self) -> Option<DbTarget> {
        self.db_path.clone().map(DbTarget::File)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RegistryConfig};
    use crate::db::DbTarget;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = RegistryConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.taxonomy_source().source_id(), "builtin");
        assert!(config.db_target().is_none());
    }

    #[test]
    fn reads_and_normalizes_values() {
        let config = RegistryConfig::from_lookup(lookup(&[
            ("NNA_TAXONOMY_PATH", "/srv/nna/taxonomy.json"),
            ("NNA_DB_PATH", " /srv/nna/counters.db "),
            ("NNA_LOG_LEVEL", "WARNING"),
            ("NNA_LOG_DIR", "   "),
        ]))
        .expect("config");

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.taxonomy_source().source_id(), "file");
        assert_eq!(
            config.db_target(),
            Some(DbTarget::File(PathBuf::from("/srv/nna/counters.db")))
        );
    }

    #[test]
    fn rejects_bad_values() {
        let err = RegistryConfig::from_lookup(lookup(&[("NNA_LOG_LEVEL", "loud")]))
            .expect_err("bad level");
        assert!(matches!(err, ConfigError::LogLevel { .. }));

        let err = RegistryConfig::from_lookup(lookup(&[("NNA_LOG_DIR", "logs")]))
            .expect_err("relative dir");
        assert!(matches!(err, ConfigError::RelativeLogDir { .. }));
    }
}
