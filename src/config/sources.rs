//! Configuration sources, applied in order after the built-in defaults.

pub mod environment;
pub mod file;
