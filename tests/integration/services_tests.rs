//! Unbound and bound behaviour of plugin services.

use std::{cell::Cell, sync::Arc};

use tracehook::{
    ErrorKind, MessageDetail, Outcome, RootSpanDetail, SpanDetail,
    testing::{EngineCall, MockEngine, MockFactory},
};

use crate::common::services;

#[derive(Debug, PartialEq)]
struct QueryError(&'static str);

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "query failed: {}", self.0)
    }
}

/// Every operation before bind follows the fallback column of the contract
#[test]
fn test_unbound_contract() {
    let services = services("jdbc").expect("valid plugin id");
    let metric = services.create_metric("sql");
    let invocations = Cell::new(0);
    let root: Arc<dyn RootSpanDetail> = Arc::new(MessageDetail::new("GET /"));

    assert!(!services.is_enabled());
    assert!(!metric.is_engine_owned());

    let ok = services.execute_root_span(&metric, root, || {
        invocations.set(invocations.get() + 1);
        Ok::<_, QueryError>("page")
    });
    assert_eq!(ok, Ok("page"));

    let err = services.execute_span(&metric, &MessageDetail::new("select"), || {
        invocations.set(invocations.get() + 1);
        Err::<(), _>(QueryError("locked"))
    });
    assert_eq!(err, Err(QueryError("locked")));

    let fallible = services.try_record_metric_data(&metric, || {
        invocations.set(invocations.get() + 1);
        Err::<(), _>(QueryError("io"))
    });
    assert_eq!(fallible, Err(QueryError("io")));

    let plain = services.record_metric_data(&metric, || {
        invocations.set(invocations.get() + 1);
        5
    });
    assert_eq!(plain, 5);
    assert_eq!(invocations.get(), 4);

    for err in [
        services.string_property("x").map(|_| ()).unwrap_err(),
        services.boolean_property("x").map(|_| ()).unwrap_err(),
        services.double_property("x").map(|_| ()).unwrap_err(),
        services.put_trace_attribute("k", "v").unwrap_err(),
        services.root_span_detail().map(|_| ()).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert!(err.kind().is_contract_violation());
    }
}

/// After bind every operation reaches the engine and its answer comes back unchanged
#[test]
fn test_bound_contract() {
    let engine = MockEngine::new()
        .with_string_property("x", "y")
        .with_boolean_property("capture", true)
        .with_double_property("threshold", 2.5);
    let services = services("jdbc").expect("valid plugin id");
    services.bind(&MockFactory::new(engine.clone())).expect("bind should succeed");

    let metric = services.create_metric("sql");
    assert!(metric.is_engine_owned());
    assert!(services.is_enabled());
    assert_eq!(services.string_property("x").expect("bound"), Some("y".to_string()));
    assert!(services.boolean_property("capture").expect("bound"));
    assert_eq!(services.double_property("threshold").expect("bound"), Some(2.5));
    services.put_trace_attribute("user", "alice").expect("bound");

    let root: Arc<dyn RootSpanDetail> = Arc::new(MessageDetail::new("GET /"));
    let result = services.execute_root_span(&metric, root, || {
        let detail = services.root_span_detail().expect("bound").expect("inside root span");
        Ok::<_, QueryError>(detail.description())
    });
    assert_eq!(result, Ok("GET /".to_string()));

    let err = services.execute_span(&metric, &MessageDetail::new("select"), || {
        Err::<(), _>(QueryError("locked"))
    });
    assert_eq!(err, Err(QueryError("locked")));

    assert_eq!(
        engine.outcomes(),
        vec![Outcome::Completed, Outcome::Failed("query failed: locked".into())]
    );
    assert!(engine.calls().contains(&EngineCall::ExecuteSpan {
        metric: "sql".into(),
        description: "select".into(),
    }));
}

/// Engine errors from accessors are returned as-is, not replaced by NotReady
#[test]
fn test_bound_engine_errors_pass_through() {
    let services = services("jdbc").expect("valid plugin id");
    services
        .bind(&MockFactory::new(MockEngine::new().with_property_error("bad config")))
        .expect("bind should succeed");

    let err = services.string_property("x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.message(), "bad config");
}

/// The factory runs once no matter how often bind is attempted
#[test]
fn test_factory_called_once() {
    let factory = MockFactory::new(MockEngine::new());
    let services = services("jdbc").expect("valid plugin id");

    services.bind(&factory).expect("first bind");
    for _ in 0..3 {
        let err = services.bind(&factory).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyBound);
        assert!(err.is_fatal());
    }

    assert_eq!(factory.create_count(), 1);
    assert_eq!(factory.plugin_ids()[0].as_str(), "jdbc");
}

/// Engine construction failure reaches the host and leaves the services usable
#[test]
fn test_engine_construction_failure() {
    let services = services("jdbc").expect("valid plugin id");
    let err = services.bind(&MockFactory::failing("storage not ready")).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EngineConstruction);
    assert_eq!(err.plugin_id(), Some("jdbc"));
    let source = std::error::Error::source(&err).expect("factory error kept as source");
    assert!(source.to_string().contains("storage not ready"));

    assert!(!services.is_bound());
    let metric = services.create_metric("sql");
    assert_eq!(services.record_metric_data(&metric, || "still works"), "still works");
}

/// Panics in the wrapped call unwind through the services unchanged
#[test]
fn test_panic_propagates() {
    let services = services("jdbc").expect("valid plugin id");
    services.bind(&MockFactory::new(MockEngine::new())).expect("bind should succeed");
    let metric = services.create_metric("sql");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        services.record_metric_data(&metric, || -> u8 { std::panic::resume_unwind(Box::new(7u8)) })
    }));

    let payload = result.unwrap_err();
    assert_eq!(payload.downcast_ref::<u8>(), Some(&7));
}
