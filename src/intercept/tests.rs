use super::*;
use crate::analysis::{Analyzer, AnalysisReport, CallSite, SourceHint};
use crate::broadcast::{Broadcaster, ChannelSubscriber};
use crate::config::{ConfigPatch, ConfigStore};
use crate::llm::{AnalysisError, AnalysisProvider, MOCK_ANALYSIS_PREFIX};
use futures::future::BoxFuture;
use serde_json::json;
use serial_test::serial;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RejectingProvider;

impl AnalysisProvider for RejectingProvider {
    fn analyze(&self, _prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        Box::pin(async move { Err(AnalysisError::new("rejecting", "HTTP 401: bad key")) })
    }

    fn provider_name(&self) -> &str {
        "rejecting"
    }
}

struct CannedProvider;

impl AnalysisProvider for CannedProvider {
    fn analyze(&self, _prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        Box::pin(async move { Ok("canned analysis".to_string()) })
    }

    fn provider_name(&self) -> &str {
        "canned"
    }
}

#[derive(Debug, thiserror::Error)]
#[error("order {0} rejected")]
struct OrderRejected(u32);

fn mock_store() -> Arc<ConfigStore> {
    let store = Arc::new(ConfigStore::new());
    store
        .configure(ConfigPatch::new().with_mock_mode(true))
        .unwrap();
    store
}

fn collecting_options() -> (InterceptOptions, Arc<Mutex<Vec<AnalysisReport>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let options = InterceptOptions::new().on_report(move |report| {
        sink.lock().unwrap().push(report);
    });
    (options, reports)
}

#[tokio::test]
async fn test_success_is_passed_through() {
    let interceptor = Interceptor::new(mock_store(), Arc::new(Broadcaster::new()));
    let (options, reports) = collecting_options();

    let double = interceptor
        .wrap(CallSite::new("Math", "double"), |x: i32| async move {
            Ok::<_, io::Error>(x * 2)
        })
        .with_options(options);

    assert_eq!(double.call(21).await.unwrap(), 42);
    assert!(reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_boom_is_returned_unchanged_and_reported() {
    let broadcaster = Arc::new(Broadcaster::new());
    let (subscriber, mut rx) = ChannelSubscriber::channel();
    broadcaster.register(Arc::new(subscriber));

    let interceptor = Interceptor::new(mock_store(), Arc::clone(&broadcaster));
    let (options, reports) = collecting_options();

    let explode = interceptor
        .wrap(CallSite::new("Service", "explode"), |()| async move {
            Err::<(), _>(io::Error::other("boom"))
        })
        .with_options(options);

    let err = explode.call(()).await.unwrap_err();
    assert!(!err.is_pipeline());
    assert_eq!(err.to_string(), "boom");
    let original = err.into_work_error().unwrap();
    assert_eq!(original.kind(), io::ErrorKind::Other);

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].error.message, "boom");
    assert_eq!(reports[0].error.error_type, "Error");
    assert!(reports[0].analysis.starts_with(MOCK_ANALYSIS_PREFIX));
    assert_eq!(reports[0].context.method, "Service.explode");
    assert!(reports[0].context.arguments.is_empty());

    let broadcast = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let decoded: AnalysisReport = serde_json::from_str(&broadcast).unwrap();
    assert_eq!(decoded, reports[0]);
}

#[tokio::test]
async fn test_arguments_are_captured() {
    let interceptor = Interceptor::new(mock_store(), Arc::new(Broadcaster::new()));
    let (options, reports) = collecting_options();

    let place = interceptor
        .wrap(
            CallSite::new("Orders", "place"),
            |(id, item): (u32, String)| async move {
                let _ = item;
                Err::<(), _>(OrderRejected(id))
            },
        )
        .with_options(options);

    let err = place.call((7, "widget".to_string())).await.unwrap_err();
    assert!(matches!(err.work_error(), Some(OrderRejected(7))));

    let reports = reports.lock().unwrap();
    assert_eq!(reports[0].error.error_type, "OrderRejected");
    assert_eq!(reports[0].error.message, "order 7 rejected");
    assert_eq!(reports[0].context.arguments, vec![json!(7), json!("widget")]);
}

#[tokio::test]
async fn test_stack_trace_gated_by_config() {
    let store = mock_store();
    let interceptor = Interceptor::new(Arc::clone(&store), Arc::new(Broadcaster::new()));
    let call_site = CallSite::new("Orders", "cancel");

    let (options, reports) = collecting_options();
    let _ = interceptor
        .run(&call_site, vec![], &options, async {
            Err::<(), _>(OrderRejected(1))
        })
        .await;

    let quiet = options
        .clone()
        .with_overrides(ConfigPatch::new().with_stack_trace(false));
    let _ = interceptor
        .run(&call_site, vec![], &quiet, async {
            Err::<(), _>(OrderRejected(2))
        })
        .await;

    let reports = reports.lock().unwrap();
    assert!(reports[0].error.stack.starts_with("OrderRejected: order 1 rejected"));
    assert_eq!(reports[1].error.stack, "");
    // Overrides are per call
    assert!(store.snapshot().config.collect_stack_trace);
}

#[tokio::test]
async fn test_per_call_provider_override() {
    let store = mock_store();
    store.register_provider("canned", |_settings| {
        Ok(Arc::new(CannedProvider) as Arc<dyn AnalysisProvider>)
    });
    let interceptor = Interceptor::new(Arc::clone(&store), Arc::new(Broadcaster::new()));

    let (options, reports) = collecting_options();
    let options = options.with_overrides(
        ConfigPatch::new()
            .with_provider("canned")
            .with_api_key("key")
            .with_mock_mode(false),
    );

    let _ = interceptor
        .run(&CallSite::new("A", "b"), vec![], &options, async {
            Err::<(), _>(OrderRejected(3))
        })
        .await;

    assert_eq!(reports.lock().unwrap()[0].analysis, "canned analysis");
    assert!(store.snapshot().mock_active);
}

#[tokio::test]
async fn test_provider_failure_keeps_original_error() {
    let store = Arc::new(ConfigStore::new());
    store.register_provider("rejecting", |_settings| {
        Ok(Arc::new(RejectingProvider) as Arc<dyn AnalysisProvider>)
    });
    store
        .configure(ConfigPatch::new().with_provider("rejecting").with_api_key("key"))
        .unwrap();
    let interceptor = Interceptor::new(store, Arc::new(Broadcaster::new()));
    let (options, reports) = collecting_options();

    let err = interceptor
        .run(&CallSite::new("A", "b"), vec![], &options, async {
            Err::<(), _>(OrderRejected(4))
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "order 4 rejected");
    assert!(reports.lock().unwrap()[0]
        .analysis
        .starts_with(MOCK_ANALYSIS_PREFIX));
}

#[tokio::test]
async fn test_pipeline_failure_replaces_error() {
    let store = Arc::new(ConfigStore::new());
    store.register_provider("rejecting", |_settings| {
        Ok(Arc::new(RejectingProvider) as Arc<dyn AnalysisProvider>)
    });
    store
        .configure(ConfigPatch::new().with_provider("rejecting").with_api_key("key"))
        .unwrap();

    let analyzer = Analyzer::new(Arc::clone(&store))
        .with_fallback(|| Arc::new(RejectingProvider) as Arc<dyn AnalysisProvider>);
    let interceptor =
        Interceptor::new(store, Arc::new(Broadcaster::new())).with_analyzer(analyzer);
    let (options, reports) = collecting_options();

    let err = interceptor
        .run(&CallSite::new("A", "b"), vec![], &options, async {
            Err::<(), _>(OrderRejected(5))
        })
        .await
        .unwrap_err();

    assert!(err.is_pipeline());
    assert!(err.work_error().is_none());
    assert!(err.to_string().starts_with("Error analysis failed:"));
    assert!(reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_source_text_reaches_prompt() {
    let interceptor = Interceptor::new(mock_store(), Arc::new(Broadcaster::new()));
    let (options, reports) = collecting_options();
    let options = options.with_source(SourceHint::Text("fn place() { todo!() }".to_string()));

    let _ = interceptor
        .run(&CallSite::new("A", "b"), vec![], &options, async {
            Err::<(), _>(OrderRejected(6))
        })
        .await;

    let reports = reports.lock().unwrap();
    assert_eq!(
        reports[0].context.source_snippet.as_deref(),
        Some("fn place() { todo!() }")
    );
    assert!(reports[0].analysis.contains("Source Code:"));
}

// Reads relative to the working directory, which config tests change
#[tokio::test]
#[serial]
async fn test_source_here_reads_this_file() {
    let interceptor = Interceptor::new(mock_store(), Arc::new(Broadcaster::new()));
    let (options, reports) = collecting_options();
    let options = options.with_source(crate::source_here!());

    let _ = interceptor
        .run(&CallSite::new("A", "b"), vec![], &options, async {
            Err::<(), _>(OrderRejected(8))
        })
        .await;

    let reports = reports.lock().unwrap();
    let snippet = reports[0].context.source_snippet.as_deref().unwrap();
    assert!(snippet.contains("source_here!"));
}

#[tokio::test]
async fn test_concurrent_failures_each_get_a_report() {
    let interceptor = Interceptor::new(mock_store(), Arc::new(Broadcaster::new()));
    let (options, reports) = collecting_options();

    let calls = (0..8u32).map(|n| {
        let interceptor = interceptor.clone();
        let options = options.clone();
        tokio::spawn(async move {
            interceptor
                .run(&CallSite::new("Batch", "item"), vec![json!(n)], &options, async move {
                    Err::<(), _>(OrderRejected(n))
                })
                .await
        })
    });

    for result in futures::future::join_all(calls).await {
        assert!(result.unwrap().unwrap_err().work_error().is_some());
    }
    assert_eq!(reports.lock().unwrap().len(), 8);
}
