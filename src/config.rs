//! Host configuration loaded from TOML.
//!
//! ```toml
//! [search]
//! default_limit = 10
//! lookup_timeout_ms = 5000
//!
//! [ingest]
//! timeout_ms = 30000
//!
//! [backend]
//! kind = "process"
//! spool_dir = "/var/tmp/bolt"
//!
//! [backend.search]
//! program = "python3"
//! args = ["search.py"]
//!
//! [backend.ingest]
//! program = "python3"
//! args = ["upload.py"]
//! ```

use std::path::{Path, PathBuf};

use bolt_search::backends::ProcessCommand;
use bolt_search::{IngestConfig, SearchConfig};
use serde::{Deserialize, Serialize};

use crate::error::{BoltError, Result};

/// Which collaborators answer lookups and take uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-process store, optionally seeded from a file at startup.
    #[default]
    Memory,
    /// Spawned scripts.
    Process {
        /// Command run once per term: `<args…> <term> <limit>`.
        search: ProcessCommand,
        /// Command run once per uploaded document.
        ingest: ProcessCommand,
        /// Hand documents over as per-call files in this directory instead of stdin.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spool_dir: Option<PathBuf>,
    },
    /// Remote HTTP service.
    Http {
        /// Root URL of the term index service.
        base_url: String,
        /// Root URL of the ingestion service, when it differs from `base_url`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ingest_url: Option<String>,
    },
}

impl BackendConfig {
    /// The `kind` tag, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Process { .. } => "process",
            Self::Http { .. } => "http",
        }
    }
}

/// Top-level configuration for the bolt host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoltConfig {
    /// Search orchestrator settings.
    pub search: SearchConfig,
    /// Ingestion gatekeeper settings.
    pub ingest: IngestConfig,
    /// Collaborator selection.
    pub backend: BackendConfig,
}

impl BoltConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path` if given, else the default path if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a chosen file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`BoltError::Config`] or the library's config error.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.ingest.validate()?;
        match &self.backend {
            BackendConfig::Memory => {}
            BackendConfig::Process { search, ingest, .. } => {
                for (role, command) in [("search", search), ("ingest", ingest)] {
                    if command.program.as_os_str().is_empty() {
                        return Err(BoltError::Config(format!(
                            "backend.{role}.program must not be empty"
                        )));
                    }
                    if command.max_output_bytes == 0 {
                        return Err(BoltError::Config(format!(
                            "backend.{role}.max_output_bytes must be greater than 0"
                        )));
                    }
                }
            }
            BackendConfig::Http { base_url, .. } => {
                if base_url.trim().is_empty() {
                    return Err(BoltError::Config(
                        "backend.base_url must not be empty".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns the default config file path: `~/.config/bolt/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("bolt").join("config.toml")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".config").join("bolt").join("config.toml")
        } else {
            PathBuf::from("/tmp/bolt-config/config.toml")
        }
    }
}
