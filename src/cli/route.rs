//! Route layer: single dispatch from parsed commands to the sync engine.

use crate::cli::parse::Commands;
use crate::cli::presentation::{format_history_json, format_history_text, format_sync_report};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::manifest::HistoryManifest;
use crate::remote::{DriveClient, RemoteStore};
use crate::sync::Uploader;
use std::path::Path;
use tracing::info;

/// Run context: validated configuration for one invocation.
pub struct RunContext {
    config: SyncConfig,
}

impl RunContext {
    /// Load and validate configuration from `config_path`.
    pub fn new(config_path: &Path) -> Result<Self, SyncError> {
        Ok(Self {
            config: SyncConfig::load_validated(config_path)?,
        })
    }

    pub fn from_config(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Execute a command against the Drive store described by the config.
    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        match command {
            Commands::Sync => {
                let client = DriveClient::new(&self.config.remote)?;
                self.sync(&client)
            }
            Commands::Check => self.check(),
            Commands::History { format } => self.history(format),
        }
    }

    /// Execute a command using `store` for any remote work.
    pub fn execute_with_store(
        &self,
        command: &Commands,
        store: &dyn RemoteStore,
    ) -> Result<String, SyncError> {
        match command {
            Commands::Sync => self.sync(store),
            other => self.execute(other),
        }
    }

    fn sync(&self, store: &dyn RemoteStore) -> Result<String, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SyncError::Io)?;

        let mut uploader = Uploader::new(&self.config, store);
        uploader.check()?;
        uploader.prepare()?;

        info!(store = store.store_name(), "Starting upload");
        let report = runtime.block_on(uploader.run())?;
        info!("Upload finished");
        Ok(format_sync_report(&report))
    }

    fn check(&self) -> Result<String, SyncError> {
        let roots = self.config.roots();
        for root in &roots {
            root.check()?;
        }
        Ok(format!("{} root(s) present", roots.len()))
    }

    fn history(&self, format: &str) -> Result<String, SyncError> {
        let manifest = HistoryManifest::load(&self.config.history_file)?;
        match format {
            "json" => format_history_json(&manifest),
            "text" => Ok(format_history_text(&manifest)),
            other => Err(SyncError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}
