use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceheadError};

/// The ways a trace page can present a trace.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TraceViewType {
    #[default]
    Timeline,
    Graph,
    Statistics,
    SpansTable,
    Flamegraph,
    Json,
}

impl TraceViewType {
    pub const ALL: [TraceViewType; 6] = [
        Self::Timeline,
        Self::Graph,
        Self::Statistics,
        Self::SpansTable,
        Self::Flamegraph,
        Self::Json,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Timeline => "Trace Timeline",
            Self::Graph => "Trace Graph",
            Self::Statistics => "Trace Statistics",
            Self::SpansTable => "Trace Spans Table",
            Self::Flamegraph => "Trace Flamegraph",
            Self::Json => "Trace JSON",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::Graph => "graph",
            Self::Statistics => "statistics",
            Self::SpansTable => "spans_table",
            Self::Flamegraph => "flamegraph",
            Self::Json => "json",
        }
    }

    /// Whether search results can be stepped through with next/previous.
    pub fn is_search_navigable(self) -> bool {
        match self {
            Self::Timeline => true,
            Self::Graph | Self::Statistics | Self::SpansTable | Self::Flamegraph | Self::Json => {
                false
            }
        }
    }
}

impl fmt::Display for TraceViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraceViewType {
    type Err = TraceheadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "timeline" | "trace_timeline_viewer" => Ok(Self::Timeline),
            "graph" | "trace_graph" => Ok(Self::Graph),
            "statistics" | "stats" => Ok(Self::Statistics),
            "spans_table" | "spans" => Ok(Self::SpansTable),
            "flamegraph" => Ok(Self::Flamegraph),
            "json" => Ok(Self::Json),
            _ => Err(TraceheadError::Parse(format!("unknown view type: {s}"))),
        }
    }
}

/// Display switches supplied by the host for the current render pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderFlags {
    pub hide_map: bool,
    pub hide_summary: bool,
    pub slim_view: bool,
    pub can_collapse: bool,
    pub disable_json_view: bool,
}
