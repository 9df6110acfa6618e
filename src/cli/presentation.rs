//! CLI presentation: text and JSON rendering of history and run results.

use crate::error::SyncError;
use crate::manifest::{HistoryManifest, RemoteRecord};
use crate::sync::SyncReport;
use comfy_table::Table;
use std::collections::BTreeMap;

pub fn format_history_text(manifest: &HistoryManifest) -> String {
    if manifest.is_empty() {
        return "No files recorded yet.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Local Path", "Title", "Remote ID", "Last Update"]);
    for (identity, record) in manifest.iter() {
        table.add_row(vec![
            identity.as_str().to_string(),
            record.title.clone(),
            record.remote_object_id.clone(),
            record.last_update_at.to_rfc3339(),
        ]);
    }
    format!("{}\n{} file(s) recorded", table, manifest.len())
}

pub fn format_history_json(manifest: &HistoryManifest) -> Result<String, SyncError> {
    let records: BTreeMap<&str, &RemoteRecord> = manifest
        .iter()
        .map(|(identity, record)| (identity.as_str(), record))
        .collect();
    serde_json::to_string_pretty(&records)
        .map_err(|e| SyncError::ConfigError(format!("Failed to render history: {}", e)))
}

pub fn format_sync_report(report: &SyncReport) -> String {
    let mut lines: Vec<String> = report
        .roots
        .iter()
        .map(|(path, r)| {
            format!(
                "{}: {} uploaded, {} updated, {} unchanged",
                path.display(),
                r.uploaded,
                r.updated,
                r.unchanged
            )
        })
        .collect();
    let totals = report.totals();
    lines.push(format!(
        "done: {} uploaded, {} updated, {} unchanged",
        totals.uploaded, totals.updated, totals.unchanged
    ));
    lines.join("\n")
}
