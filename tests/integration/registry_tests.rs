//! Host startup through the services registry.

use std::sync::Arc;

use tracehook::{
    ErrorKind, MessageDetail, ServicesRegistry,
    collector::TraceCollector,
    config::EngineConfig,
    registry,
    testing::{ManualTicker, MockFactory},
};

use crate::common::init_tracing;

/// Hooks registered early and late all end up on the same collector
#[test]
fn test_startup_sequence() {
    init_tracing();
    let registry = ServicesRegistry::new(Arc::new(ManualTicker::new()));
    let jdbc = registry.get("jdbc").expect("valid id");
    let early_metric = jdbc.create_metric("sql");

    let early = jdbc.execute_span(&early_metric, &MessageDetail::new("select 1"), || Ok::<_, String>(1));
    assert_eq!(early, Ok(1));

    let collector = TraceCollector::new(EngineConfig::default()).expect("valid config");
    registry.start(Arc::new(collector.factory())).expect("start should succeed");

    let servlet = registry.get("servlet").expect("valid id");
    assert!(jdbc.is_enabled());
    assert!(servlet.is_enabled());

    let http = servlet.create_metric("http request");
    let sql = jdbc.create_metric("sql");
    servlet
        .execute_root_span(&http, Arc::new(MessageDetail::new("GET /")), || {
            jdbc.execute_span(&sql, &MessageDetail::new("select 1"), || Ok::<_, String>(()))
        })
        .expect("work succeeds");

    let traces = collector.completed_traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].spans.len(), 1);
    assert_eq!(collector.metric_names(), vec!["http request", "sql"]);
}

/// A registry that failed to start binds nothing and can start again
#[test]
fn test_start_retry_after_failure() {
    init_tracing();
    let registry = ServicesRegistry::new(Arc::new(ManualTicker::new()));
    let jdbc = registry.get("jdbc").expect("valid id");

    let err = registry.start(Arc::new(MockFactory::failing("not yet"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineConstruction);
    assert!(!jdbc.is_bound());

    let collector = TraceCollector::new(EngineConfig::default()).expect("valid config");
    registry.start(Arc::new(collector.factory())).expect("retry should succeed");
    assert!(jdbc.is_bound());

    let err = registry.start(Arc::new(collector.factory())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyBound);
}

/// The process-wide registry hands out one instance per plugin
#[test]
fn test_global_registry() {
    init_tracing();
    let a = registry::global().get("global-test").expect("valid id");
    let b = registry::global().get("global-test").expect("valid id");
    assert!(Arc::ptr_eq(&a, &b));
}
