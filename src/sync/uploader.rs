//! Uploader lifecycle: check every root, load the manifest, then sync the
//! roots in configured order.

use super::driver::{RootReport, SyncDriver};
use super::SyncRoot;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::manifest::HistoryManifest;
use crate::remote::RemoteStore;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a full run, one entry per root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub roots: Vec<(PathBuf, RootReport)>,
}

impl SyncReport {
    pub fn totals(&self) -> RootReport {
        self.roots
            .iter()
            .fold(RootReport::default(), |mut acc, (_, r)| {
                acc.uploaded += r.uploaded;
                acc.updated += r.updated;
                acc.unchanged += r.unchanged;
                acc
            })
    }
}

pub struct Uploader<'a> {
    roots: Vec<SyncRoot>,
    driver: SyncDriver<'a>,
    manifest: Option<HistoryManifest>,
}

impl<'a> Uploader<'a> {
    pub fn new(config: &SyncConfig, store: &'a dyn RemoteStore) -> Self {
        let driver = SyncDriver::new(store, config.folder.clone(), config.history_file.clone())
            .with_ignore_patterns(config.ignore.clone())
            .with_strict_folder_match(config.strict_folder_match);
        Self {
            roots: config.roots(),
            driver,
            manifest: None,
        }
    }

    /// Verify every configured local path exists before any remote work.
    pub fn check(&self) -> Result<(), SyncError> {
        for root in &self.roots {
            root.check()?;
        }
        Ok(())
    }

    /// Load the history manifest.
    pub fn prepare(&mut self) -> Result<(), SyncError> {
        self.manifest = Some(HistoryManifest::load(self.driver.manifest_path())?);
        Ok(())
    }

    /// Sync every root in order, stopping at the first failure.
    pub async fn run(&mut self) -> Result<SyncReport, SyncError> {
        if self.manifest.is_none() {
            self.prepare()?;
        }
        let manifest = self.manifest.get_or_insert_with(HistoryManifest::new);
        let mut report = SyncReport::default();

        for root in &self.roots {
            info!(
                from = %root.local_path.display(),
                to = %root.remote_path,
                "Syncing root"
            );
            let root_report = self.driver.run(root, manifest).await?;
            report.roots.push((root.local_path.clone(), root_report));
        }

        Ok(report)
    }

    pub fn manifest(&self) -> Option<&HistoryManifest> {
        self.manifest.as_ref()
    }
}
