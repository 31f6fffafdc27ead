use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::TraceId;
use crate::model::process::Process;
use crate::model::span::Span;

/// A fully loaded trace. Never mutated after loading; hosts share it behind
/// an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trace {
    pub trace_id: TraceId,
    pub trace_name: String,
    /// Microseconds since the Unix epoch.
    pub start_time: i64,
    /// Microseconds.
    pub duration: u64,
    pub spans: Vec<Span>,
    pub processes: BTreeMap<String, Process>,
}

impl Trace {
    pub fn service_names(&self) -> BTreeSet<&str> {
        self.processes
            .values()
            .map(|p| p.service_name.as_str())
            .collect()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.spans.iter().map(|s| s.depth).max()
    }

    pub fn process_of(&self, span: &Span) -> Option<&Process> {
        self.processes.get(&span.process_id)
    }

    pub fn end_time(&self) -> i64 {
        self.start_time
            .saturating_add(i64::try_from(self.duration).unwrap_or(i64::MAX))
    }
}
