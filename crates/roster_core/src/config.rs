//! Core configuration.
//!
//! # Responsibility
//! - Describe store, paging and logging settings in one serde model.
//! - Load it from TOML with every field defaulted.
//!
//! # Invariants
//! - A validated config has `0 < paging.default_size <= paging.max_size`.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::default_log_level;
use crate::query::page::{PageRequest, PagingError, Sort, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_PAGE_SIZE: u32 = 2000;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config TOML: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub paging: PagingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file. `None` opens an in-memory store.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    /// Switch file databases to WAL journaling.
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
            wal: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl PagingConfig {
    /// Builds a request from boundary input, applying the default size and
    /// rejecting sizes above `max_size`.
    pub fn request(
        &self,
        page: u32,
        size: Option<u32>,
        sort: Sort,
    ) -> Result<PageRequest, PagingError> {
        let size = size.unwrap_or(self.default_size);
        if size > self.max_size {
            return Err(PagingError::PageSizeTooLarge {
                size,
                max: self.max_size,
            });
        }
        PageRequest::new(page, size, sort)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Rolling log file directory. `None` logs to stderr.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.paging.default_size == 0 {
            return Err(ConfigError::Invalid(
                "paging.default_size must be greater than zero".to_string(),
            ));
        }
        if self.paging.max_size < self.paging.default_size {
            return Err(ConfigError::Invalid(format!(
                "paging.max_size {} is smaller than paging.default_size {}",
                self.paging.max_size, self.paging.default_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::query::page::{PagingError, Sort};
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.paging.default_size, 5);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn partial_document_overrides_selected_fields() {
        let config = CoreConfig::from_toml_str(
            r#"
            [database]
            path = "/tmp/roster.db"
            wal = true

            [paging]
            default_size = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/roster.db")));
        assert!(config.database.wal);
        assert_eq!(config.paging.default_size, 20);
        assert_eq!(config.paging.max_size, 2000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CoreConfig::from_toml_str("[paging]\npage_size = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_default_size_is_invalid() {
        let err = CoreConfig::from_toml_str("[paging]\ndefault_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn paging_request_applies_default_and_max() {
        let config = CoreConfig::default();
        let request = config.paging.request(2, None, Sort::unsorted()).unwrap();
        assert_eq!(request.size(), 5);
        assert_eq!(request.page(), 2);

        let err = config
            .paging
            .request(0, Some(5000), Sort::unsorted())
            .unwrap_err();
        assert_eq!(
            err,
            PagingError::PageSizeTooLarge {
                size: 5000,
                max: 2000
            }
        );
    }
}
