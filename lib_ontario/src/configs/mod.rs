//! # Configuration Modules
//!
//! This module aggregates the configuration surface of the library: API
//! keys, per-source rate limits and caching knobs, loaded from JSON5 files.

// // Statements: Exporting sub-modules to make them accessible via lib_ontario::configs
/// Library settings loaded from JSON5 documents or files.
pub mod settings;

pub use settings::{Settings, SettingsError};
