use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::format::{TraceFormatter, split_datetime};
use crate::model::trace::Trace;

/// A summary value as handed to the row renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SummaryValue {
    /// A timestamp split into its whole-second part and the sub-second tail.
    Timestamp { main: String, detail: Option<String> },
    Text(String),
    Count(usize),
}

impl std::fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timestamp { main, detail } => {
                write!(f, "{main}{}", detail.as_deref().unwrap_or_default())
            }
            Self::Text(text) => f.write_str(text),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SummaryRow {
    pub key: &'static str,
    pub label: &'static str,
    pub value: SummaryValue,
}

type Renderer = fn(&Trace, &dyn TraceFormatter) -> SummaryValue;

struct HeaderItem {
    key: &'static str,
    label: &'static str,
    render: Renderer,
}

const HEADER_ITEMS: [HeaderItem; 5] = [
    HeaderItem {
        key: "timestamp",
        label: "Trace Start",
        render: render_start,
    },
    HeaderItem {
        key: "duration",
        label: "Duration",
        render: render_duration,
    },
    HeaderItem {
        key: "service-count",
        label: "Services",
        render: render_service_count,
    },
    HeaderItem {
        key: "depth",
        label: "Depth",
        render: render_depth,
    },
    HeaderItem {
        key: "span-count",
        label: "Total Spans",
        render: render_span_count,
    },
];

/// Projects a trace onto the fixed, ordered list of header summary rows.
pub fn project(trace: &Trace, formatter: &dyn TraceFormatter) -> Vec<SummaryRow> {
    HEADER_ITEMS
        .iter()
        .map(|item| SummaryRow {
            key: item.key,
            label: item.label,
            value: (item.render)(trace, formatter),
        })
        .collect()
}

fn render_start(trace: &Trace, formatter: &dyn TraceFormatter) -> SummaryValue {
    let (main, detail) = split_datetime(&formatter.format_datetime(trace.start_time));
    SummaryValue::Timestamp { main, detail }
}

fn render_duration(trace: &Trace, formatter: &dyn TraceFormatter) -> SummaryValue {
    SummaryValue::Text(formatter.format_duration(trace.duration))
}

fn render_service_count(trace: &Trace, _: &dyn TraceFormatter) -> SummaryValue {
    SummaryValue::Count(trace.service_names().len())
}

fn render_depth(trace: &Trace, _: &dyn TraceFormatter) -> SummaryValue {
    SummaryValue::Count(trace.max_depth().unwrap_or(0) + 1)
}

fn render_span_count(trace: &Trace, _: &dyn TraceFormatter) -> SummaryValue {
    SummaryValue::Count(trace.spans.len())
}

/// Memoized summary rows for the most recently supplied trace.
///
/// Traces are immutable once loaded, so the rows stay valid for as long as
/// the same `Arc<Trace>` is supplied. Handing in a different trace object
/// (even one with the same id) recomputes.
#[derive(Debug, Default)]
pub struct SummaryCache {
    entry: Option<CacheEntry>,
    computed: usize,
}

#[derive(Debug)]
struct CacheEntry {
    trace_id: String,
    trace: Arc<Trace>,
    rows: Vec<SummaryRow>,
}

impl SummaryCache {
    pub fn rows(&mut self, trace: &Arc<Trace>, formatter: &dyn TraceFormatter) -> &[SummaryRow] {
        let hit = self.entry.as_ref().is_some_and(|entry| {
            entry.trace_id == trace.trace_id.as_str() && Arc::ptr_eq(&entry.trace, trace)
        });
        if !hit {
            tracing::debug!(trace_id = %trace.trace_id, "projecting trace summary");
            self.computed += 1;
            self.entry = Some(CacheEntry {
                trace_id: trace.trace_id.as_str().to_string(),
                trace: Arc::clone(trace),
                rows: project(trace, formatter),
            });
        }
        self.entry
            .as_ref()
            .map(|entry| entry.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// How many times rows were actually projected.
    pub fn computed(&self) -> usize {
        self.computed
    }
}
