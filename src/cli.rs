//! CLI domain: parse, route, output and presentation only.
//! Sync orchestration lives in `crate::sync`.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_history_json, format_history_text, format_sync_report};
pub use route::RunContext;
