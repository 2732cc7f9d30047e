//! Environment constants and path utilities for error-lens.
//!
//! This module centralizes the file names, directory names and environment
//! variables the CLI and configuration loader look at.

use std::path::{Path, PathBuf};

/// Application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".error-lens";

/// Configuration file name inside an application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file looked up in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "error-lens.toml";

/// System-wide configuration directory (Unix-like systems)
pub const SYSTEM_CONFIG_DIR: &str = "/etc/error-lens";

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "error_lens=info";

/// Environment variables read by the configuration loader
pub mod vars {
    pub const PROVIDER: &str = "ERROR_LENS_PROVIDER";
    pub const API_KEY: &str = "ERROR_LENS_API_KEY";
    pub const MODEL: &str = "ERROR_LENS_MODEL";
    pub const BASE_URL: &str = "ERROR_LENS_BASE_URL";
    pub const MOCK_MODE: &str = "ERROR_LENS_MOCK_MODE";
    pub const COLLECT_STACK_TRACE: &str = "ERROR_LENS_COLLECT_STACK_TRACE";
    pub const TIMEOUT_SECS: &str = "ERROR_LENS_TIMEOUT_SECS";

    /// Explicit config file path, skipping discovery
    pub const CONFIG_PATH: &str = "ERROR_LENS_CONFIG";

    /// All variables, for diagnostics and test cleanup
    pub const ALL: [&str; 8] = [
        PROVIDER,
        API_KEY,
        MODEL,
        BASE_URL,
        MOCK_MODE,
        COLLECT_STACK_TRACE,
        TIMEOUT_SECS,
        CONFIG_PATH,
    ];
}

/// Build the application directory path from a base directory
pub fn app_dir_path(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build the `.error-lens/config.toml` path in a project directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    app_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

/// Build the `error-lens.toml` path in a project directory
pub fn local_flat_config_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(LOCAL_CONFIG_FILE_NAME)
}

pub fn system_config_file_path() -> PathBuf {
    Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME)
}
