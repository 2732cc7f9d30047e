//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Explicit path: `$ERROR_LENS_CONFIG`
//! 2. Current directory: ./error-lens.toml or ./.error-lens/config.toml
//! 3. User config: ~/.error-lens/config.toml
//! 4. System config: /etc/error-lens/config.toml
//! 5. Built-in defaults
//!
//! Environment variables override the file, and CLI flags override both.

use crate::config::ConfigPatch;
use crate::env::{self, vars};
use crate::llm::{ConfigError, ProviderKind};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub collect_stack_trace: Option<bool>,
    pub mock_mode: Option<bool>,
    pub analysis_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))
    }

    pub fn to_patch(&self) -> ConfigPatch {
        ConfigPatch {
            provider: self.provider.as_deref().map(ProviderKind::from),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            collect_stack_trace: self.collect_stack_trace,
            mock_mode: self.mock_mode,
            base_url: self.base_url.clone(),
            analysis_timeout: self.analysis_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Read the `ERROR_LENS_*` variables from the process environment.
pub fn patch_from_env() -> Result<ConfigPatch, ConfigError> {
    patch_from_lookup(|name| std_env::var(name).ok())
}

/// Build a patch from an arbitrary variable lookup. Empty values are ignored.
pub fn patch_from_lookup<F>(lookup: F) -> Result<ConfigPatch, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let mut patch = ConfigPatch::new();
    if let Some(provider) = get(vars::PROVIDER) {
        patch = patch.with_provider(provider.as_str());
    }
    if let Some(api_key) = get(vars::API_KEY) {
        patch = patch.with_api_key(api_key);
    }
    if let Some(model) = get(vars::MODEL) {
        patch = patch.with_model(model);
    }
    if let Some(base_url) = get(vars::BASE_URL) {
        patch = patch.with_base_url(base_url);
    }
    if let Some(value) = get(vars::MOCK_MODE) {
        patch = patch.with_mock_mode(parse_bool(vars::MOCK_MODE, &value)?);
    }
    if let Some(value) = get(vars::COLLECT_STACK_TRACE) {
        patch = patch.with_stack_trace(parse_bool(vars::COLLECT_STACK_TRACE, &value)?);
    }
    if let Some(value) = get(vars::TIMEOUT_SECS) {
        let secs: u64 = value.parse().map_err(|_| {
            ConfigError::Invalid(format!("{} must be a number of seconds, got '{}'", vars::TIMEOUT_SECS, value))
        })?;
        patch = patch.with_timeout(Duration::from_secs(secs));
    }
    Ok(patch)
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load the configuration file, if any
    ///
    /// A path named by `$ERROR_LENS_CONFIG` replaces discovery and must be
    /// readable.
    pub fn discover_config() -> Result<(Option<PathBuf>, FileConfig), ConfigError> {
        if let Some(explicit) = Self::explicit_config_path() {
            info!("Loading configuration from {}: {:?}", vars::CONFIG_PATH, explicit);
            let config = FileConfig::from_toml_file(&explicit)?;
            return Ok((Some(explicit), config));
        }

        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            let config = FileConfig::from_toml_file(&config_path)?;
            return Ok((Some(config_path), config));
        }

        info!("No configuration file found, using defaults");
        Ok((None, FileConfig::default()))
    }

    /// Layer file, environment and `cli` overrides, highest precedence last.
    ///
    /// `config_override` replaces discovery with an explicit file.
    pub fn load_patch(
        config_override: Option<&Path>,
        cli: ConfigPatch,
    ) -> Result<ConfigPatch, ConfigError> {
        let file = match config_override {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                FileConfig::from_toml_file(path)?
            }
            None => Self::discover_config()?.1,
        };

        Ok(file.to_patch().merge(patch_from_env()?).merge(cli))
    }

    /// Find configuration file using discovery hierarchy
    ///
    /// An explicit `$ERROR_LENS_CONFIG` path is returned as is, even when it
    /// does not exist, so that loading it reports the problem.
    pub fn find_config_file() -> Option<PathBuf> {
        if let Some(explicit) = Self::explicit_config_path() {
            debug!("Using config file from {}: {:?}", vars::CONFIG_PATH, explicit);
            return Some(explicit);
        }

        for candidate in Self::get_config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    pub fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(env::local_flat_config_file_path(&current_dir));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(env::system_config_file_path());

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(
                PathBuf::from(program_data)
                    .join("error-lens")
                    .join(env::CONFIG_FILE_NAME),
            );
        }

        candidates
    }

    /// Path named by `$ERROR_LENS_CONFIG`, ignoring an empty value
    pub fn explicit_config_path() -> Option<PathBuf> {
        std_env::var_os(vars::CONFIG_PATH)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    fn file_status(path: &Path) -> &'static str {
        if !path.exists() {
            "✗ NOT FOUND"
        } else if path.is_file() {
            "✓ EXISTS"
        } else {
            "✗ NOT A FILE"
        }
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        let explicit = Self::explicit_config_path();
        if let Some(path) = &explicit {
            println!(
                "  0. {:?} ({}) - {}",
                path,
                vars::CONFIG_PATH,
                Self::file_status(path)
            );
            println!("  (discovery candidates below are skipped)");
        }

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            println!("  {}. {:?} - {}", i + 1, candidate, Self::file_status(candidate));
        }

        println!();
        if let Some(found) = Self::find_config_file() {
            println!("Active configuration: {:?}", found);
        } else {
            println!("Active configuration: Built-in defaults");
        }
    }
}
