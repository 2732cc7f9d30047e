//! CLI-specific functionality for error-lens
//!
//! This module contains argument parsing and configuration discovery.

pub mod args;
pub mod config;

pub use args::{AnalyzeConfig, Args, DemoConfig, ExecutionMode, SettingsConfig};
pub use config::{ConfigDiscovery, FileConfig, patch_from_env};
