//! # lmsx-config
//!
//! Layered configuration loading for the LMS exporter using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LMSX_*` prefix, `__` as separator)
//! 2. An explicit `--config` file
//! 3. `./lmsx.toml` in the working directory
//! 4. User-level `~/.config/lmsx/config.toml`
//! 5. Built-in defaults
//!
//! Command-line flags are applied on top of the loaded value by the binary.
//!
//! # Environment Variable Mapping
//!
//! `LMSX_MYSQL__PASSWORD` -> `mysql.password`, `LMSX_BUCKETS__DATA` -> `buckets.data`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use lmsx_config::ExportConfig;
//!
//! let config = ExportConfig::load_with_dotenv(None).expect("config");
//! println!("reports under {}", config.paths.report_root.display());
//! ```

mod buckets;
mod error;
mod lms;
mod mysql;
mod paths;
mod run;
mod serde_helpers;
mod structures;
mod tools;

pub use buckets::BucketsConfig;
pub use error::ConfigError;
pub use lms::LmsConfig;
pub use mysql::MysqlConfig;
pub use paths::PathsConfig;
pub use run::RunConfig;
pub use structures::StructuresConfig;
pub use tools::{ConvertConfig, SyncConfig};

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use lmsx_core::{ReportLayout, TableExportSpec, default_tables};
use serde::{Deserialize, Serialize};

/// Project-local config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "lmsx.toml";

/// Prefix of the environment variables figment reads.
pub const ENV_PREFIX: &str = "LMSX_";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub mysql: MysqlConfig,
    #[serde(default)]
    pub lms: LmsConfig,
    #[serde(default)]
    pub buckets: BucketsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub structures: StructuresConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub run: RunConfig,
    /// Tables to export, in order. Replaces the default list when set.
    #[serde(default = "default_tables")]
    pub tables: Vec<TableExportSpec>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mysql: MysqlConfig::default(),
            lms: LmsConfig::default(),
            buckets: BucketsConfig::default(),
            paths: PathsConfig::default(),
            convert: ConvertConfig::default(),
            structures: StructuresConfig::default(),
            sync: SyncConfig::default(),
            run: RunConfig::default(),
            tables: default_tables(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from all sources.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if `explicit` does not exist, or
    /// [`ConfigError::Figment`] if any layer fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(explicit)?
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the working directory.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can extract from it directly or layer extra providers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if `explicit` does not exist.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lmsx").join("config.toml"))
    }

    /// The local report tree described by `paths.report_root`.
    #[must_use]
    pub fn layout(&self) -> ReportLayout {
        ReportLayout::new(self.paths.report_root.clone())
    }

    /// Check values that cannot be fixed up at run time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty table list, an
    /// invalid table spec, an empty converter program, or `use_sudo`
    /// without an `output_owner`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tables.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tables".to_string(),
                reason: "at least one table is required".to_string(),
            });
        }
        for spec in &self.tables {
            spec.validate().map_err(|error| ConfigError::InvalidValue {
                field: "tables".to_string(),
                reason: error.to_string(),
            })?;
        }
        if self.convert.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "convert.program".to_string(),
                reason: "a conversion program is required".to_string(),
            });
        }
        if self.buckets.prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "buckets.prefix".to_string(),
                reason: "bucket discovery needs a name prefix".to_string(),
            });
        }
        if self.paths.use_sudo && self.paths.output_owner.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "paths.output_owner".to_string(),
                reason: "use_sudo creates root-owned directories; an owner is required to hand them back"
                    .to_string(),
            });
        }
        Ok(())
    }
}
