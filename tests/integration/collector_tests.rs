//! The reference engine driven through plugin services.

use std::{sync::Arc, thread, time::Duration};

use tracehook::{
    MessageDetail, Outcome, PluginId, PluginServices,
    collector::TraceCollector,
    config::EngineConfig,
    testing::ManualTicker,
};

use crate::common::init_tracing;

fn bound(collector: &TraceCollector, plugin: &str, ticker: Arc<ManualTicker>) -> PluginServices {
    let services = PluginServices::new(PluginId::new(plugin).expect("valid id"), ticker);
    services.bind(&collector.factory()).expect("bind should succeed");
    services
}

/// Spans from a second plugin nest inside the trace another plugin opened
#[test]
fn test_cross_plugin_trace() {
    init_tracing();
    let ticker = Arc::new(ManualTicker::new());
    let collector = TraceCollector::with_ticker(EngineConfig::default(), ticker.clone())
        .expect("default config is valid");
    let servlet = bound(&collector, "servlet", ticker.clone());
    let jdbc = bound(&collector, "jdbc", ticker.clone());
    let http = servlet.create_metric("http request");
    let sql = jdbc.create_metric("sql");

    let result = servlet.execute_root_span(&http, Arc::new(MessageDetail::new("GET /orders")), || {
        ticker.advance(Duration::from_millis(1));
        let rows = jdbc.execute_span(&sql, &MessageDetail::new("select * from orders"), || {
            ticker.advance(Duration::from_millis(2));
            Ok::<_, String>(3)
        })?;
        jdbc.put_trace_attribute("rows", &rows.to_string()).map_err(|err| err.to_string())?;
        Err::<u32, _>(format!("render failed after {rows} rows"))
    });

    assert_eq!(result, Err("render failed after 3 rows".to_string()));
    let trace = collector.drain_completed_traces().pop().expect("one trace");
    assert_eq!(trace.plugin_id, "servlet");
    assert_eq!(trace.metric, "http request");
    assert_eq!(trace.duration, Duration::from_millis(3));
    assert_eq!(trace.outcome, Outcome::Failed("render failed after 3 rows".into()));
    assert_eq!(trace.attribute("rows"), Some("3"));
    assert_eq!(trace.spans.len(), 1);
    assert_eq!(trace.spans[0].metric, "sql");
    assert_eq!(trace.spans[0].offset, Duration::from_millis(1));
    assert_eq!(trace.spans[0].outcome, Outcome::Completed);
}

/// Each thread assembles its own trace
#[test]
fn test_traces_are_per_thread() {
    init_tracing();
    let collector = TraceCollector::new(EngineConfig::default()).expect("valid config");
    let services = Arc::new(bound(&collector, "servlet", Arc::new(ManualTicker::new())));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let services = services.clone();
            thread::spawn(move || {
                let metric = services.create_metric("http request");
                let path = format!("/{n}");
                services
                    .execute_root_span(&metric, Arc::new(MessageDetail::new(path.clone())), || {
                        services.put_trace_attribute("path", &path)
                    })
                    .expect("attribute accepted");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let traces = collector.completed_traces();
    assert_eq!(traces.len(), 4);
    for trace in &traces {
        assert_eq!(trace.attribute("path"), Some(trace.description.as_str()));
        assert!(trace.spans.is_empty());
    }
    assert_eq!(collector.active_trace_count(), 0);
    assert_eq!(collector.metric_snapshot("http request").expect("recorded").count, 4);
}

/// Every completed trace gets its own id
#[test]
fn test_trace_ids_are_unique() {
    init_tracing();
    let collector = TraceCollector::new(EngineConfig::default()).expect("valid config");
    let services = bound(&collector, "servlet", Arc::new(ManualTicker::new()));
    let metric = services.create_metric("http request");

    for _ in 0..3 {
        services
            .execute_root_span(&metric, Arc::new(MessageDetail::new("GET /")), || Ok::<_, String>(()))
            .expect("work succeeds");
    }

    let mut ids: Vec<_> = collector.completed_traces().into_iter().map(|trace| trace.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}
