//! Configuration System
//!
//! Declarative list of local-to-remote upload pairs plus remote store settings.
//! Loaded through the `config` crate: built-in defaults, then the config file
//! (YAML or TOML), then `DRIVESYNC_*` environment overrides.

use crate::error::SyncError;
use crate::logging::LoggingConfig;
use crate::sync::SyncRoot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;
mod sources;

/// One configured local source and its remote destination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub from: PathBuf,
    #[serde(default)]
    pub to: String,
}

/// Remote store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Metadata API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Media upload API base URL
    #[serde(default = "default_upload_endpoint")]
    pub upload_endpoint: String,

    /// Bearer token obtained out of band
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_endpoint() -> String {
    defaults::DRIVE_ENDPOINT.to_string()
}

fn default_upload_endpoint() -> String {
    defaults::DRIVE_UPLOAD_ENDPOINT.to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            upload_endpoint: default_upload_endpoint(),
            access_token: None,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote folder id every destination path is resolved beneath
    #[serde(default = "default_folder")]
    pub folder: String,

    #[serde(default)]
    pub uploads: Vec<UploadConfig>,

    /// History manifest location, relative to the working directory
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Fail on duplicate folder titles instead of adopting the first match
    #[serde(default)]
    pub strict_folder_match: bool,

    /// Path component names skipped during traversal
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_folder() -> String {
    defaults::ROOT_FOLDER.to_string()
}

fn default_history_file() -> PathBuf {
    PathBuf::from(defaults::HISTORY_FILE)
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            uploads: Vec::new(),
            history_file: default_history_file(),
            strict_folder_match: false,
            ignore: Vec::new(),
            remote: RemoteConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Upload(usize, String),
    System(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Upload(index, msg) => write!(f, "Upload #{}: {}", index, msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SyncConfig {
    /// Load configuration from `path` layered over defaults and environment.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let builder = defaults::builder_with_defaults()?;
        let builder = sources::file::add_to_builder(builder, path)?;
        let builder = sources::environment::add_to_builder(builder);

        let config: SyncConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load and validate, folding validation failures into one error.
    pub fn load_validated(path: &Path) -> Result<Self, SyncError> {
        let config = Self::load(path)?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            SyncError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.folder.trim().is_empty() {
            errors.push(ValidationError::System(
                "Root folder id cannot be empty".to_string(),
            ));
        }
        if self.history_file.as_os_str().is_empty() {
            errors.push(ValidationError::System(
                "History file path cannot be empty".to_string(),
            ));
        }

        for (index, upload) in self.uploads.iter().enumerate() {
            if upload.from.as_os_str().is_empty() {
                errors.push(ValidationError::Upload(
                    index,
                    "'from' cannot be empty".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Configured roots, in configuration order.
    pub fn roots(&self) -> Vec<SyncRoot> {
        self.uploads
            .iter()
            .map(|u| SyncRoot::new(u.from.clone(), u.to.clone()))
            .collect()
    }
}
