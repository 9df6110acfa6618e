//! Drivesync: incremental mirroring of local file trees into a remote folder store
//!
//! Walks configured local roots, uploads files the history manifest has not
//! seen, re-sends files whose modification time changed, and records every
//! result so an interrupted run resumes where it stopped.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod remote;
pub mod resolver;
pub mod sync;
