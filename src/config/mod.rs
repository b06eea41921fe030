//! Configuration source: string properties loaded once from a properties file.

mod keys;

pub use keys::*;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default properties file, relative to the working directory.
pub const DEFAULT_PROPERTIES_PATH: &str = "application.properties";

/// Read-only `key -> value` map populated once at startup.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PropertySource {
    values: BTreeMap<String, String>,
}

impl PropertySource {
    /// Load a `.properties` file. A missing file yields an empty source.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "properties file not found, continuing without it");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let values: BTreeMap<String, String> = java_properties::read(BufReader::new(file))
            .map_err(|source| ConfigError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .into_iter()
            .collect();
        debug!(path = %path.display(), count = values.len(), "loaded properties");
        Ok(Self { values })
    }

    /// Overlay values from the process environment (see [`Self::with_overrides_from`]).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(std::env::vars())
    }

    /// Overlay values from `NAME=value` pairs, where `DB_URL` overrides `db.url`.
    /// Only the recognized keys in [`ALL_KEYS`] can be overridden.
    pub fn with_overrides_from<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let candidates: BTreeMap<String, &str> =
            ALL_KEYS.iter().map(|k| (env_name(k), *k)).collect();

        for (name, value) in vars {
            if let Some(key) = candidates.get(&name) {
                debug!(key = %key, env = %name, "property overridden from environment");
                self.values.insert(key.to_string(), value);
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or an empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingProperty(key.to_string()))
    }

    /// Parse `key` as an `i32`, falling back to `default` when the key is absent.
    pub fn get_i32_or(&self, key: &str, default: i32) -> Result<i32, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|source| ConfigError::Parse {
                key: key.to_string(),
                value: raw.to_string(),
                source,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for PropertySource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for PropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if key.contains("password") {
                map.entry(key, &"***");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Environment variable name for a property key: `dbcp.max-idle` -> `DBCP_MAX_IDLE`.
pub fn env_name(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open properties file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse properties file {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: java_properties::PropertiesError,
    },

    #[error("invalid integer for {key}: '{value}'")]
    Parse {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("missing required property {0}")]
    MissingProperty(String),
}
