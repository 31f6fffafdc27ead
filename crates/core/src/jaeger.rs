//! Loading traces from Jaeger query JSON.
//!
//! Accepts either the API envelope (`{"data": [...]}`) or a single bare
//! trace object. Span depth, span order, trace bounds and the trace name
//! are derived here, once, so the rest of the crate can treat a [`Trace`]
//! as immutable.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, TraceheadError};
use crate::ids::{SpanId, TraceId};
use crate::model::{Process, RefType, Span, SpanReference, Trace};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Envelope { data: Vec<RawTrace> },
    Single(RawTrace),
}

#[derive(Debug, Deserialize)]
struct RawTrace {
    #[serde(rename = "traceID")]
    trace_id: String,
    #[serde(default)]
    spans: Vec<RawSpan>,
    #[serde(default)]
    processes: BTreeMap<String, RawProcess>,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    #[serde(rename = "spanID")]
    span_id: String,
    #[serde(rename = "operationName", default)]
    operation_name: String,
    #[serde(default)]
    references: Vec<RawReference>,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(default)]
    duration: u64,
    #[serde(rename = "processID")]
    process_id: String,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    #[serde(rename = "refType")]
    ref_type: RefType,
    #[serde(rename = "traceID")]
    trace_id: String,
    #[serde(rename = "spanID")]
    span_id: String,
}

#[derive(Debug, Deserialize)]
struct RawProcess {
    #[serde(rename = "serviceName")]
    service_name: String,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

pub fn parse_traces(input: &str) -> Result<Vec<Trace>> {
    let document: Document = serde_json::from_str(input)
        .map_err(|e| TraceheadError::Parse(format!("invalid trace json: {e}")))?;
    let raw = match document {
        Document::Envelope { data } => data,
        Document::Single(trace) => vec![trace],
    };
    raw.into_iter().map(build_trace).collect()
}

pub fn read_traces(path: &Path) -> Result<Vec<Trace>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| TraceheadError::Io(format!("failed reading {}: {e}", path.display())))?;
    parse_traces(&raw)
}

/// Picks the trace with `trace_id`, or the first trace when no id is given.
pub fn select_trace(traces: Vec<Trace>, trace_id: Option<&str>) -> Result<Trace> {
    match trace_id {
        Some(id) => {
            let wanted = TraceId::parse(id)?;
            traces
                .into_iter()
                .find(|t| t.trace_id == wanted)
                .ok_or_else(|| TraceheadError::InvalidArgument(format!("trace {wanted} not found")))
        }
        None => traces
            .into_iter()
            .next()
            .ok_or_else(|| TraceheadError::InvalidArgument("document contains no traces".to_string())),
    }
}

fn build_trace(raw: RawTrace) -> Result<Trace> {
    let trace_id = TraceId::parse(&raw.trace_id)?;
    let processes: BTreeMap<String, Process> = raw
        .processes
        .into_iter()
        .map(|(id, p)| {
            let tags = p
                .tags
                .into_iter()
                .map(|t| (t.key, tag_text(t.value)))
                .collect();
            (
                id,
                Process {
                    service_name: p.service_name,
                    tags,
                },
            )
        })
        .collect();

    let mut spans = Vec::with_capacity(raw.spans.len());
    for span in raw.spans {
        if !processes.contains_key(&span.process_id) {
            return Err(TraceheadError::Parse(format!(
                "span {} references unknown process {}",
                span.span_id, span.process_id
            )));
        }
        let references = span
            .references
            .into_iter()
            .map(|r| {
                Ok(SpanReference {
                    ref_type: r.ref_type,
                    trace_id: TraceId::parse(&r.trace_id)?,
                    span_id: SpanId::parse(&r.span_id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        spans.push(Span {
            span_id: SpanId::parse(&span.span_id)?,
            operation_name: span.operation_name,
            start_time: span.start_time,
            duration: span.duration,
            depth: 0,
            process_id: span.process_id,
            references,
        });
    }

    let spans = order_by_tree(spans);
    let start_time = spans.iter().map(|s| s.start_time).min().unwrap_or(0);
    let end_time = spans.iter().map(Span::end_time).max().unwrap_or(start_time);
    let duration = u64::try_from(end_time.saturating_sub(start_time)).unwrap_or(0);

    let trace_name = spans
        .first()
        .map(|root| {
            let service = processes
                .get(&root.process_id)
                .map(|p| p.service_name.as_str())
                .unwrap_or_default();
            format!("{service}: {}", root.operation_name)
        })
        .unwrap_or_default();

    tracing::debug!(%trace_id, spans = spans.len(), processes = processes.len(), "loaded trace");

    Ok(Trace {
        trace_id,
        trace_name,
        start_time,
        duration,
        spans,
        processes,
    })
}

/// Orders spans depth-first from the roots, siblings by start time, and
/// assigns each span its depth. A span whose parent is not in the trace is
/// a root. Spans caught in a reference cycle are rooted at the earliest of
/// them.
fn order_by_tree(spans: Vec<Span>) -> Vec<Span> {
    let mut index: HashMap<SpanId, usize> = HashMap::with_capacity(spans.len());
    for (i, span) in spans.iter().enumerate() {
        if index.insert(span.span_id.clone(), i).is_some() {
            tracing::warn!(span_id = %span.span_id, "duplicate span id; later span wins");
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); spans.len()];
    let mut roots = Vec::new();
    for (i, span) in spans.iter().enumerate() {
        match span.parent_span_id().and_then(|p| index.get(p)) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let by_start = |a: &usize, b: &usize| {
        spans[*a]
            .start_time
            .cmp(&spans[*b].start_time)
            .then_with(|| spans[*a].span_id.as_str().cmp(spans[*b].span_id.as_str()))
    };
    for kids in &mut children {
        kids.sort_by(by_start);
    }
    roots.sort_by(by_start);

    let mut depth = vec![0usize; spans.len()];
    let mut visited = vec![false; spans.len()];
    let mut order = Vec::with_capacity(spans.len());
    let mut pending_roots = roots.into_iter();

    loop {
        let next_root = pending_roots.next().or_else(|| {
            (0..spans.len())
                .filter(|i| !visited[*i])
                .min_by(by_start)
        });
        let Some(root) = next_root else {
            break;
        };
        if visited[root] {
            continue;
        }

        let mut stack = vec![(root, 0usize)];
        while let Some((i, d)) = stack.pop() {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            depth[i] = d;
            order.push(i);
            for &child in children[i].iter().rev() {
                if !visited[child] {
                    stack.push((child, d + 1));
                }
            }
        }
    }

    let mut slots: Vec<Option<Span>> = spans.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| {
            slots[i].take().map(|mut span| {
                span.depth = depth[i];
                span
            })
        })
        .collect()
}

fn tag_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
