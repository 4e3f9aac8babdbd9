//! Configuration parsing for `dwh.cfg`
//!
//! The file is INI with the sections `CLUSTER`, `IAM_ROLE`, `S3` and an
//! optional `PIPELINE`. Section and key names are case-insensitive, and a
//! value wrapped in one pair of quotes is unwrapped.

use crate::copy::ObjectLocation;
use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::sql_utils::strip_wrapping_quotes;
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dwh.cfg";

/// Region the source buckets live in unless `[PIPELINE] REGION` says otherwise
pub const DEFAULT_REGION: &str = "us-west-2";

/// Entity name of the aggregate-country rows in the pandemic dataset
pub const DEFAULT_COUNTRY: &str = "United States";

const DEFAULT_DUCKDB_PATH: &str = ":memory:";

/// Warehouse backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Amazon Redshift over the PostgreSQL wire protocol (default)
    #[default]
    Redshift,
    /// Embedded DuckDB, for local runs
    DuckDb,
}

impl Backend {
    pub fn dialect(self) -> Dialect {
        match self {
            Backend::Redshift => Dialect::Redshift,
            Backend::DuckDb => Dialect::DuckDb,
        }
    }
}

impl FromStr for Backend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redshift" => Ok(Backend::Redshift),
            "duckdb" => Ok(Backend::DuckDb),
            other => Err(CoreError::ConfigInvalid {
                message: format!("unknown backend '{}' (expected redshift or duckdb)", other),
            }),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Redshift => write!(f, "redshift"),
            Backend::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// How a driver commits its statement sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Commit after every statement; a failure keeps earlier statements
    #[default]
    PerStatement,
    /// One transaction per driver run; a failure rolls everything back
    Atomic,
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitMode::PerStatement => write!(f, "per-statement"),
            CommitMode::Atomic => write!(f, "atomic"),
        }
    }
}

/// Transport security of the cluster connection, as libpq names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP only
    Disable,
    /// TLS when the server offers it, plain TCP otherwise (default)
    #[default]
    Prefer,
    /// TLS or fail
    Require,
}

impl FromStr for SslMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(CoreError::ConfigInvalid {
                message: format!(
                    "[CLUSTER] SSLMODE must be disable, prefer or require, got '{}'",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Prefer => write!(f, "prefer"),
            SslMode::Require => write!(f, "require"),
        }
    }
}

/// `[CLUSTER]` connection settings
#[derive(Debug)]
pub struct ClusterConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: SecretString,
    pub port: u16,
    pub ssl_mode: SslMode,
}

/// `[S3]` source file locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocations {
    /// Collision records
    pub accident: ObjectLocation,
    /// City demographic records
    pub city: ObjectLocation,
    /// Pandemic records
    pub covid: ObjectLocation,
}

/// `[PIPELINE]` settings, all optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub backend: Backend,
    pub duckdb_path: String,
    pub region: String,
    pub country: String,
    pub commit_mode: CommitMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            duckdb_path: DEFAULT_DUCKDB_PATH.to_string(),
            region: DEFAULT_REGION.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            commit_mode: CommitMode::default(),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug)]
pub struct WarehouseConfig {
    /// Required for the Redshift backend
    pub cluster: Option<ClusterConfig>,
    /// Role the warehouse assumes to read the source buckets.
    /// Required for the Redshift backend.
    pub iam_role_arn: Option<SecretString>,
    pub sources: SourceLocations,
    pub pipeline: PipelineConfig,
}

impl WarehouseConfig {
    /// Load configuration from an INI file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.is_file() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_ini_str(&contents)
    }

    /// Parse configuration from INI text
    pub fn from_ini_str(contents: &str) -> CoreResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Ini))
            .build()
            .map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        let raw: HashMap<String, HashMap<String, String>> =
            settings
                .try_deserialize()
                .map_err(|e| CoreError::ConfigParseError {
                    message: e.to_string(),
                })?;

        Self::from_sections(&Sections::new(raw))
    }

    fn from_sections(sections: &Sections) -> CoreResult<Self> {
        let pipeline = PipelineConfig::from_sections(sections)?;

        let cluster = if sections.has_section("CLUSTER") {
            Some(ClusterConfig::from_sections(sections)?)
        } else {
            None
        };
        let iam_role_arn = sections
            .get("IAM_ROLE", "ARN")
            .map(|arn| SecretString::new(arn.to_string()));

        if pipeline.backend == Backend::Redshift {
            if cluster.is_none() {
                return Err(CoreError::ConfigMissingKey {
                    section: "CLUSTER".into(),
                    key: "HOST".into(),
                });
            }
            if iam_role_arn.is_none() {
                return Err(CoreError::ConfigMissingKey {
                    section: "IAM_ROLE".into(),
                    key: "ARN".into(),
                });
            }
        }

        let sources = SourceLocations {
            accident: ObjectLocation::new(sections.require("S3", "ACCIDENT_DATA")?),
            city: ObjectLocation::new(sections.require("S3", "CITY_DATA")?),
            covid: ObjectLocation::new(sections.require("S3", "COVID_DATA")?),
        };

        Ok(Self {
            cluster,
            iam_role_arn,
            sources,
            pipeline,
        })
    }
}

impl ClusterConfig {
    fn from_sections(sections: &Sections) -> CoreResult<Self> {
        let port = sections.require("CLUSTER", "DWH_PORT")?;
        let port = port.parse::<u16>().map_err(|_| CoreError::ConfigInvalid {
            message: format!("[CLUSTER] DWH_PORT must be a port number, got '{}'", port),
        })?;
        let ssl_mode = match sections.get("CLUSTER", "SSLMODE") {
            Some(value) => value.parse()?,
            None => SslMode::default(),
        };

        Ok(Self {
            host: sections.require("CLUSTER", "HOST")?.to_string(),
            database: sections.require("CLUSTER", "DWH_DB")?.to_string(),
            user: sections.require("CLUSTER", "DWH_DB_USER")?.to_string(),
            password: SecretString::new(sections.require("CLUSTER", "DWH_DB_PASSWORD")?.to_string()),
            port,
            ssl_mode,
        })
    }
}

impl PipelineConfig {
    fn from_sections(sections: &Sections) -> CoreResult<Self> {
        let defaults = Self::default();

        let backend = match sections.get("PIPELINE", "BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };
        let commit_mode = match sections.get("PIPELINE", "ATOMIC") {
            Some(value) if parse_bool(value)? => CommitMode::Atomic,
            _ => CommitMode::PerStatement,
        };
        let text = |key: &str, default: String| {
            sections
                .get("PIPELINE", key)
                .map(str::to_string)
                .unwrap_or(default)
        };

        Ok(Self {
            backend,
            duckdb_path: text("DUCKDB_PATH", defaults.duckdb_path),
            region: text("REGION", defaults.region),
            country: text("COUNTRY", defaults.country),
            commit_mode,
        })
    }
}

fn parse_bool(value: &str) -> CoreResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(CoreError::ConfigInvalid {
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

/// Case-insensitive view over the parsed INI sections
struct Sections(HashMap<String, HashMap<String, String>>);

impl Sections {
    fn new(raw: HashMap<String, HashMap<String, String>>) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (section, entries) in raw {
            let target = sections.entry(section.to_ascii_uppercase()).or_default();
            for (key, value) in entries {
                target.insert(key.to_ascii_uppercase(), value);
            }
        }
        Self(sections)
    }

    fn has_section(&self, section: &str) -> bool {
        self.0.contains_key(section)
    }

    /// Unquoted, non-empty value
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.0
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(|value| strip_wrapping_quotes(value))
            .filter(|value| !value.is_empty())
    }

    fn require(&self, section: &str, key: &str) -> CoreResult<&str> {
        self.get(section, key)
            .ok_or_else(|| CoreError::ConfigMissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
