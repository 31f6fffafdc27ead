use serde::{Deserialize, Serialize};

use crate::ids::{SpanId, TraceId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    ChildOf,
    FollowsFrom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpanReference {
    pub ref_type: RefType,
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub span_id: SpanId,
    pub operation_name: String,
    /// Microseconds since the Unix epoch.
    pub start_time: i64,
    /// Microseconds.
    pub duration: u64,
    /// Distance from the root of the span tree; roots are 0.
    pub depth: usize,
    pub process_id: String,
    #[serde(default)]
    pub references: Vec<SpanReference>,
}

impl Span {
    pub fn end_time(&self) -> i64 {
        self.start_time
            .saturating_add(i64::try_from(self.duration).unwrap_or(i64::MAX))
    }

    /// The span this one hangs under: the first `CHILD_OF` reference, or the
    /// first reference of any kind when there is none.
    pub fn parent_span_id(&self) -> Option<&SpanId> {
        self.references
            .iter()
            .find(|r| r.ref_type == RefType::ChildOf)
            .or_else(|| self.references.first())
            .map(|r| &r.span_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_with_refs(references: Vec<SpanReference>) -> Span {
        Span {
            span_id: SpanId::parse("00000000000000ff").unwrap(),
            operation_name: "op".to_string(),
            start_time: 1_000,
            duration: 250,
            depth: 0,
            process_id: "p1".to_string(),
            references,
        }
    }

    fn reference(ref_type: RefType, span: &str) -> SpanReference {
        SpanReference {
            ref_type,
            trace_id: TraceId::parse("abc123").unwrap(),
            span_id: SpanId::parse(span).unwrap(),
        }
    }

    #[test]
    fn end_time_adds_duration() {
        assert_eq!(span_with_refs(vec![]).end_time(), 1_250);
    }

    #[test]
    fn parent_prefers_child_of() {
        let span = span_with_refs(vec![
            reference(RefType::FollowsFrom, "0000000000000001"),
            reference(RefType::ChildOf, "0000000000000002"),
        ]);
        assert_eq!(span.parent_span_id().unwrap().as_str(), "0000000000000002");
    }

    #[test]
    fn parent_falls_back_to_follows_from() {
        let span = span_with_refs(vec![reference(RefType::FollowsFrom, "0000000000000001")]);
        assert_eq!(span.parent_span_id().unwrap().as_str(), "0000000000000001");
        assert!(span_with_refs(vec![]).parent_span_id().is_none());
    }
}
