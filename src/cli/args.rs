//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `analyze`: Analyze an error described on the command line
//! - `demo`: Intercept a failing function and show what a subscriber receives
//! - `providers`: List registered analysis providers
//! - `show-config`: Show configuration discovery information

use crate::analysis::{CallSite, ErrorFacts};
use crate::config::ConfigPatch;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum ExecutionMode {
    Analyze(AnalyzeConfig),
    Demo(DemoConfig),
    Providers,
    ShowConfig(SettingsConfig),
}

/// Provider selection shared by every command
#[derive(Debug)]
pub struct SettingsConfig {
    pub config_override: Option<PathBuf>,
    pub overrides: ConfigPatch,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct AnalyzeConfig {
    pub facts: ErrorFacts,
    pub call_site: CallSite,
    pub arguments: Vec<Value>,
    pub settings: SettingsConfig,
}

#[derive(Debug)]
pub struct DemoConfig {
    pub message: String,
    pub settings: SettingsConfig,
}

#[derive(Debug, Parser)]
#[command(name = "error-lens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Intercepts failures, asks an LLM for a root-cause analysis and broadcasts the report")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct ProviderArgs {
    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Analysis provider (mock, openai, huggingface, palm, anthropic, groq)
    #[arg(short = 'p', long = "provider")]
    pub provider: Option<String>,
    /// API key for the provider
    #[arg(long = "api-key")]
    pub api_key: Option<String>,
    /// Model override
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,
    /// Base URL override for the provider API
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
    /// Force the mock provider
    #[arg(long = "mock")]
    pub mock: bool,
    /// Do not collect stack traces
    #[arg(long = "no-stack-trace")]
    pub no_stack_trace: bool,
    /// Abort a provider call after this many seconds and fall back to mock
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,
    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl ProviderArgs {
    /// Only flags that were actually given end up in the patch.
    pub fn to_patch(&self) -> ConfigPatch {
        let mut patch = ConfigPatch::new();
        if let Some(provider) = &self.provider {
            patch = patch.with_provider(provider.as_str());
        }
        if let Some(api_key) = &self.api_key {
            patch = patch.with_api_key(api_key.clone());
        }
        if let Some(model) = &self.model {
            patch = patch.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            patch = patch.with_base_url(base_url.clone());
        }
        if self.mock {
            patch = patch.with_mock_mode(true);
        }
        if self.no_stack_trace {
            patch = patch.with_stack_trace(false);
        }
        if let Some(secs) = self.timeout_secs {
            patch = patch.with_timeout(Duration::from_secs(secs));
        }
        patch
    }

    fn settings(&self) -> SettingsConfig {
        SettingsConfig {
            config_override: self.config.clone(),
            overrides: self.to_patch(),
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze an error described on the command line
    Analyze {
        /// Error type name
        #[arg(short = 't', long = "type", default_value = "Error")]
        error_type: String,
        /// Error message
        #[arg(short = 'e', long = "message")]
        message: String,
        /// Failing method as Owner.method
        #[arg(long = "method")]
        method: String,
        /// Stack trace text
        #[arg(long = "stack")]
        stack: Option<String>,
        /// Call argument as JSON (can be used multiple times)
        #[arg(long = "arg", value_name = "JSON")]
        args: Vec<String>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Intercept a failing function and print what a subscriber receives
    Demo {
        /// Message of the simulated failure
        #[arg(long = "message", default_value = "boom")]
        message: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// List registered analysis providers
    Providers,
    /// Show configuration discovery information and the effective configuration
    ShowConfig {
        #[command(flatten)]
        provider: ProviderArgs,
    },
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Analyze {
                error_type,
                message,
                method,
                stack,
                args,
                provider,
            }) => Ok(ExecutionMode::Analyze(AnalyzeConfig {
                facts: ErrorFacts::new(
                    error_type.clone(),
                    message.clone(),
                    stack.clone().unwrap_or_default(),
                ),
                call_site: Self::parse_method(method)?,
                arguments: args.iter().map(|arg| Self::parse_argument(arg)).collect(),
                settings: provider.settings(),
            })),
            Some(Commands::Demo { message, provider }) => Ok(ExecutionMode::Demo(DemoConfig {
                message: message.clone(),
                settings: provider.settings(),
            })),
            Some(Commands::Providers) => Ok(ExecutionMode::Providers),
            Some(Commands::ShowConfig { provider }) => {
                Ok(ExecutionMode::ShowConfig(provider.settings()))
            }
            None => Err(
                "No command specified. Use 'error-lens --help' to see available commands."
                    .to_string(),
            ),
        }
    }

    /// Split `Owner.method` at the last dot.
    fn parse_method(method: &str) -> Result<CallSite, String> {
        match method.trim().rsplit_once('.') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(CallSite::new(owner, name))
            }
            _ => Err(format!(
                "Invalid method '{}': expected Owner.method",
                method
            )),
        }
    }

    /// JSON if it parses, otherwise the raw text as a string.
    fn parse_argument(arg: &str) -> Value {
        serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
    }
}
