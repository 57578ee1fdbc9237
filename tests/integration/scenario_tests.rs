//! End-to-end scenarios across the bind transition.

use std::{sync::Arc, time::Duration};

use tracehook::{
    ErrorKind, Metric, MessageDetail, PluginId, PluginServices,
    collector::TraceCollector,
    config::{EngineConfig, PluginConfig},
    testing::{ManualTicker, MockEngine, MockFactory},
};

use crate::common::init_tracing;

/// A metric created before bind stays standalone and never feeds the engine
#[test]
fn test_metric_created_before_bind_stays_standalone() {
    init_tracing();
    let ticker = Arc::new(ManualTicker::new());
    let collector = TraceCollector::with_ticker(EngineConfig::default(), ticker.clone())
        .expect("default config is valid");
    let services = PluginServices::new(PluginId::new("jdbc").expect("valid id"), ticker.clone());

    let h1 = services.create_metric("sql");
    services.bind(&collector.factory()).expect("bind should succeed");
    let h2 = services.create_metric("sql");

    assert!(!h1.is_engine_owned());
    assert!(h2.is_engine_owned());
    assert!(!Metric::ptr_eq(&h1, &h2));

    h1.record(Duration::from_millis(4));
    let timer = h1.start();
    ticker.advance(Duration::from_millis(2));
    assert_eq!(timer.stop(), Duration::from_millis(2));
    assert_eq!(h1.snapshot().count, 2);

    services.record_metric_data(&h1, || ticker.advance(Duration::from_millis(5)));
    services
        .execute_span(&h1, &MessageDetail::new("select 1"), || Ok::<_, String>(()))
        .expect("work succeeds");
    let untouched = collector.metric_snapshot("sql").expect("h2 registered sql");
    assert_eq!(untouched.count, 0);
    assert_eq!(h1.snapshot().count, 4);

    services.record_metric_data(&h2, || ticker.advance(Duration::from_millis(3)));

    let engine_sql = collector.metric_snapshot("sql").expect("engine saw sql");
    assert_eq!(engine_sql.count, 1);
    assert_eq!(engine_sql.total(), Duration::from_millis(3));
    assert_eq!(h1.snapshot().count, 4);
}

/// A property read fails before bind and returns the engine value after
#[test]
fn test_property_read_across_bind() {
    init_tracing();
    let services = PluginServices::new(
        PluginId::new("jdbc").expect("valid id"),
        Arc::new(ManualTicker::new()),
    );

    let err = services.string_property("x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotReady);

    services
        .bind(&MockFactory::new(MockEngine::new().with_string_property("x", "y")))
        .expect("bind should succeed");
    assert_eq!(services.string_property("x").expect("bound"), Some("y".to_string()));
}

/// Properties come from the plugin's section of the engine configuration
#[test]
fn test_properties_from_json_config() {
    init_tracing();
    let config = EngineConfig::from_json_str(
        r#"{
            "plugins": {
                "jdbc": { "properties": { "x": "y", "capture": true, "threshold": 1.5 } }
            }
        }"#,
    )
    .expect("valid config");
    let collector = TraceCollector::new(config).expect("valid config");
    let services = PluginServices::new(
        PluginId::new("jdbc").expect("valid id"),
        Arc::new(ManualTicker::new()),
    );
    services.bind(&collector.factory()).expect("bind should succeed");

    assert!(services.is_enabled());
    assert_eq!(services.string_property("x").expect("bound"), Some("y".into()));
    assert!(services.boolean_property("capture").expect("bound"));
    assert_eq!(services.double_property("threshold").expect("bound"), Some(1.5));
    assert_eq!(services.double_property("missing").expect("bound"), None);
}

/// A disabled engine is reported through is_enabled while calls still pass
#[test]
fn test_disabled_engine() {
    init_tracing();
    let config = EngineConfig::default().with_plugin("jdbc", PluginConfig::new());
    let config = EngineConfig { enabled: false, ..config };
    let collector = TraceCollector::new(config).expect("valid config");
    let services = PluginServices::new(
        PluginId::new("jdbc").expect("valid id"),
        Arc::new(ManualTicker::new()),
    );
    services.bind(&collector.factory()).expect("bind should succeed");

    assert!(!services.is_enabled());
    let metric = services.create_metric("sql");
    assert_eq!(services.record_metric_data(&metric, || 9), 9);
}

/// Details with context and user flow through to the recorded trace
#[test]
fn test_detail_context_reaches_trace() {
    init_tracing();
    let collector = TraceCollector::new(EngineConfig::default()).expect("valid config");
    let services = PluginServices::new(
        PluginId::new("servlet").expect("valid id"),
        Arc::new(ManualTicker::new()),
    );
    services.bind(&collector.factory()).expect("bind should succeed");
    let http = services.create_metric("http request");
    let sql = services.create_metric("sql");

    let detail = MessageDetail::new("POST /orders").with_username("alice");
    services
        .execute_root_span(&http, Arc::new(detail), || {
            services.execute_span(
                &sql,
                &MessageDetail::new("insert into orders").with_context("rows", "1"),
                || Ok::<_, String>(()),
            )
        })
        .expect("work succeeds");

    let traces = collector.completed_traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].username.as_deref(), Some("alice"));
    assert_eq!(traces[0].spans[0].context, vec![("rows".to_string(), "1".to_string())]);
}
