//! Built-in defaults applied before any file or environment source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub const ROOT_FOLDER: &str = "root";
pub const HISTORY_FILE: &str = ".history.json";
pub const DRIVE_ENDPOINT: &str = "https://www.googleapis.com/drive/v2";
pub const DRIVE_UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v2";

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("folder", ROOT_FOLDER)?
        .set_default("history_file", HISTORY_FILE)?
        .set_default("strict_folder_match", false)?
        .set_default("remote.endpoint", DRIVE_ENDPOINT)?
        .set_default("remote.upload_endpoint", DRIVE_UPLOAD_ENDPOINT)
}
