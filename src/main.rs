use anyhow::{Context, Result};
use error_lens::cli::{AnalyzeConfig, Args, ConfigDiscovery, DemoConfig, ExecutionMode, SettingsConfig};
use error_lens::env::DEFAULT_LOG_FILTER;
use error_lens::{
    Analyzer, AnalysisReport, Broadcaster, CallSite, ChannelSubscriber, ConfigStore,
    ContextBuilder, InterceptOptions, Interceptor, SourceHint,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct DemoFailure {
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    init_logging(verbose(&mode));

    match mode {
        ExecutionMode::Analyze(config) => run_analyze(config).await,
        ExecutionMode::Demo(config) => run_demo(config).await,
        ExecutionMode::Providers => {
            for name in ConfigStore::global().provider_names() {
                println!("{}", name);
            }
            Ok(())
        }
        ExecutionMode::ShowConfig(settings) => {
            ConfigDiscovery::show_discovery_info();
            let store = configured_store(&settings)?;
            let effective = store.snapshot();
            println!();
            println!("Effective configuration:");
            println!("{:#?}", effective.config.redacted());
            println!("Active provider: {}", effective.provider.provider_name());
            Ok(())
        }
    }
}

fn verbose(mode: &ExecutionMode) -> bool {
    match mode {
        ExecutionMode::Analyze(config) => config.settings.verbose,
        ExecutionMode::Demo(config) => config.settings.verbose,
        ExecutionMode::ShowConfig(settings) => settings.verbose,
        ExecutionMode::Providers => false,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "error_lens=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply file, environment and CLI settings to the global store.
///
/// A provider that cannot be configured leaves the store in mock mode, which
/// is reported and otherwise tolerated.
fn configured_store(settings: &SettingsConfig) -> Result<Arc<ConfigStore>> {
    let patch = ConfigDiscovery::load_patch(
        settings.config_override.as_deref(),
        settings.overrides.clone(),
    )
    .context("Failed to load configuration")?;

    let store = ConfigStore::global();
    if let Err(e) = store.configure(patch) {
        warn!("{}; continuing in mock mode", e);
    }
    Ok(store)
}

async fn run_analyze(config: AnalyzeConfig) -> Result<()> {
    let store = configured_store(&config.settings)?;
    let builder = ContextBuilder::new(store.snapshot().config.collect_stack_trace);
    let mut facts = config.facts;
    if !builder.collects_stack_trace() {
        facts.stack.clear();
    }
    let context = builder.invocation(&config.call_site, config.arguments, &SourceHint::None);

    info!("Analyzing {} from {}", facts.error_type, config.call_site);
    let report = Analyzer::new(store).analyze(facts, context).await?;
    print_report(&report)
}

async fn run_demo(config: DemoConfig) -> Result<()> {
    let store = configured_store(&config.settings)?;
    let broadcaster = Arc::new(Broadcaster::new());
    let (subscriber, mut received) = ChannelSubscriber::channel();
    let closed = subscriber.closed();
    broadcaster.attach(Arc::new(subscriber), closed);

    let interceptor = Interceptor::new(store, Arc::clone(&broadcaster));
    let failing = interceptor
        .wrap(CallSite::new("Demo", "explode"), |message: String| async move {
            Err::<(), _>(DemoFailure { message })
        })
        .with_options(InterceptOptions::new().with_source(error_lens::source_here!()));

    match failing.call(config.message).await {
        Ok(()) => println!("Demo work unexpectedly succeeded"),
        Err(e) if e.is_pipeline() => return Err(e.into()),
        Err(e) => println!("Caller received the original error: {}", e),
    }

    let message = tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .context("Subscriber did not receive the report")?
        .context("Subscriber channel closed")?;
    println!("Subscriber received:");
    let report: AnalysisReport = serde_json::from_str(&message)?;
    print_report(&report)
}

fn print_report(report: &AnalysisReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
