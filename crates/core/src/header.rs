//! Host-facing trace header state.
//!
//! [`TraceHeader`] owns what the header needs across renders: the trace
//! reference, display flags, the active view, memoized summary rows and the
//! view-range coordinator. Rendering itself happens elsewhere; this type
//! only answers what should be shown.

use std::sync::Arc;

use serde::Serialize;

use crate::format::{DefaultFormatter, TraceFormatter};
use crate::model::trace::Trace;
use crate::summary::{SummaryCache, SummaryRow};
use crate::view::{HeaderFlags, TraceViewType};
use crate::view_range::{
    Phase, TimelineEvent, ViewRange, ViewRangeCoordinator, ViewRangeTimeUpdate,
};

/// Shown in place of a name for traces whose root span is missing.
pub const NAMELESS_TRACE: &str = "<trace-without-root-span>";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HeaderTitle {
    pub trace_id: String,
    pub short_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderSnapshot {
    pub title: HeaderTitle,
    pub view_type: TraceViewType,
    pub summary: Option<Vec<SummaryRow>>,
    pub show_minimap: bool,
    pub search_navigable: bool,
    pub alt_views: Vec<TraceViewType>,
    pub range: ViewRange,
    pub phase: Phase,
}

#[derive(Debug)]
pub struct TraceHeader<F: TraceFormatter = DefaultFormatter> {
    trace: Option<Arc<Trace>>,
    flags: HeaderFlags,
    view_type: TraceViewType,
    formatter: F,
    summary: SummaryCache,
    range: ViewRangeCoordinator,
}

impl<F: TraceFormatter> TraceHeader<F> {
    pub fn new(formatter: F, flags: HeaderFlags, view_type: TraceViewType) -> Self {
        Self {
            trace: None,
            flags,
            view_type,
            formatter,
            summary: SummaryCache::default(),
            range: ViewRangeCoordinator::new(),
        }
    }

    pub fn trace(&self) -> Option<&Arc<Trace>> {
        self.trace.as_ref()
    }

    /// Supplies the trace to show. A different trace object drops the
    /// memoized summary and resets the selection to the whole trace.
    pub fn set_trace(&mut self, trace: Option<Arc<Trace>>) {
        let same = match (&self.trace, &trace) {
            (Some(old), Some(new)) => Arc::ptr_eq(old, new),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }

        self.summary.invalidate();
        self.trace = trace;
        if let Some(trace) = &self.trace {
            tracing::debug!(trace_id = %trace.trace_id, spans = trace.spans.len(), "header trace changed");
            self.range.commit(ViewRangeTimeUpdate::range(0.0, 1.0));
        }
    }

    pub fn flags(&self) -> HeaderFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: HeaderFlags) {
        self.flags = flags;
    }

    /// Collapses or expands the header. Only collapsible headers respond.
    pub fn toggle_slim(&mut self) -> bool {
        if self.flags.can_collapse {
            self.flags.slim_view = !self.flags.slim_view;
        }
        self.flags.slim_view
    }

    pub fn view_type(&self) -> TraceViewType {
        self.view_type
    }

    /// Switching to another view drops any unfinished drag and selects the
    /// whole trace again.
    pub fn set_view_type(&mut self, view_type: TraceViewType) {
        if view_type == self.view_type {
            return;
        }
        tracing::debug!(from = %self.view_type, to = %view_type, "trace view changed");
        self.view_type = view_type;
        self.range.commit(ViewRangeTimeUpdate::range(0.0, 1.0));
    }

    pub fn title(&self) -> Option<HeaderTitle> {
        let trace = self.trace.as_ref()?;
        let name = if trace.trace_name.is_empty() {
            NAMELESS_TRACE.to_string()
        } else {
            trace.trace_name.clone()
        };
        Some(HeaderTitle {
            trace_id: trace.trace_id.as_str().to_string(),
            short_id: trace.trace_id.short().to_string(),
            name,
        })
    }

    /// Summary rows, or `None` when the header shows no summary. The
    /// projector is not consulted in that case.
    pub fn summary_rows(&mut self) -> Option<&[SummaryRow]> {
        if self.flags.hide_summary || self.flags.slim_view {
            return None;
        }
        let trace = self.trace.as_ref()?;
        Some(self.summary.rows(trace, &self.formatter))
    }

    pub fn show_minimap(&self) -> bool {
        self.trace.is_some() && !self.flags.hide_map && !self.flags.slim_view
    }

    pub fn search_navigable(&self) -> bool {
        self.view_type.is_search_navigable()
    }

    /// Views offered in the view switcher, excluding the active one.
    pub fn alt_view_options(&self) -> Vec<TraceViewType> {
        TraceViewType::ALL
            .into_iter()
            .filter(|v| *v != self.view_type)
            .filter(|v| !(self.flags.disable_json_view && *v == TraceViewType::Json))
            .collect()
    }

    pub fn on_timeline_event(&mut self, event: TimelineEvent) {
        if self.trace.is_none() {
            tracing::trace!(?event, "ignoring timeline event without a trace");
            return;
        }
        self.range.apply(event);
    }

    pub fn range(&self) -> &ViewRangeCoordinator {
        &self.range
    }

    pub fn range_mut(&mut self) -> &mut ViewRangeCoordinator {
        &mut self.range
    }

    pub fn summary_cache(&self) -> &SummaryCache {
        &self.summary
    }

    /// Everything the header would render, or `None` before a trace is
    /// loaded.
    pub fn snapshot(&mut self) -> Option<HeaderSnapshot> {
        let title = self.title()?;
        let summary = self.summary_rows().map(<[SummaryRow]>::to_vec);
        Some(HeaderSnapshot {
            title,
            view_type: self.view_type,
            summary,
            show_minimap: self.show_minimap(),
            search_navigable: self.search_navigable(),
            alt_views: self.alt_view_options(),
            range: self.range.current_range(),
            phase: self.range.phase(),
        })
    }
}

impl Default for TraceHeader<DefaultFormatter> {
    fn default() -> Self {
        Self::new(
            DefaultFormatter::default(),
            HeaderFlags::default(),
            TraceViewType::default(),
        )
    }
}
