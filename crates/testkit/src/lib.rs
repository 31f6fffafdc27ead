use std::collections::BTreeMap;

use tracehead_core::ids::{SpanId, TraceId};
use tracehead_core::model::{Process, Span, Trace};

pub const SAMPLE_TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

/// 2026-02-01T00:00:00.250Z in microseconds.
pub const SAMPLE_START: i64 = 1_769_904_000_250_000;

/// A trace with one span per entry of `depths`, spread across the given
/// `(process id, service name)` pairs round-robin.
pub fn trace_with(depths: &[usize], processes: &[(&str, &str)]) -> Trace {
    let spans = depths
        .iter()
        .enumerate()
        .map(|(i, depth)| Span {
            span_id: SpanId::parse(&format!("{:016x}", i + 1)).unwrap(),
            operation_name: format!("op-{i}"),
            start_time: SAMPLE_START + (i as i64) * 1_000,
            duration: 500,
            depth: *depth,
            process_id: processes
                .get(i % processes.len().max(1))
                .map(|(id, _)| id.to_string())
                .unwrap_or_default(),
            references: Vec::new(),
        })
        .collect();

    Trace {
        trace_id: TraceId::parse(SAMPLE_TRACE_ID).unwrap(),
        trace_name: "api: GET /v1/orders".to_string(),
        start_time: SAMPLE_START,
        duration: 1_800_000,
        spans,
        processes: processes
            .iter()
            .map(|(id, service)| (id.to_string(), Process::new(*service)))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Jaeger query JSON for a small three-service trace:
///
/// ```text
/// api GET /v1/orders            0ms .. 1800ms
///   api cache.get redis       900ms .. 1600ms
///     redis GET                 950ms .. 1200ms
///   orders-db SELECT           100ms .. 400ms
/// ```
pub fn jaeger_document() -> String {
    let start = SAMPLE_START;
    serde_json::json!({
        "data": [{
            "traceID": SAMPLE_TRACE_ID,
            "spans": [
                span("00000000000000a1", None, "GET /v1/orders", start, 1_800_000, "p1"),
                span("00000000000000a2", Some("00000000000000a1"), "cache.get redis", start + 900_000, 700_000, "p1"),
                span("00000000000000a3", Some("00000000000000a2"), "GET", start + 950_000, 250_000, "p2"),
                span("00000000000000a4", Some("00000000000000a1"), "SELECT", start + 100_000, 300_000, "p3"),
            ],
            "processes": {
                "p1": { "serviceName": "api", "tags": [] },
                "p2": { "serviceName": "redis", "tags": [] },
                "p3": { "serviceName": "orders-db", "tags": [] },
            },
            "warnings": null
        }],
        "total": 0,
        "limit": 0,
        "offset": 0,
        "errors": null
    })
    .to_string()
}

fn span(
    id: &str,
    parent: Option<&str>,
    operation: &str,
    start: i64,
    duration: u64,
    process: &str,
) -> serde_json::Value {
    let references: Vec<serde_json::Value> = parent
        .map(|p| {
            serde_json::json!({
                "refType": "CHILD_OF",
                "traceID": SAMPLE_TRACE_ID,
                "spanID": p,
            })
        })
        .into_iter()
        .collect();
    serde_json::json!({
        "traceID": SAMPLE_TRACE_ID,
        "spanID": id,
        "operationName": operation,
        "references": references,
        "startTime": start,
        "duration": duration,
        "tags": [],
        "logs": [],
        "processID": process,
        "warnings": null
    })
}
