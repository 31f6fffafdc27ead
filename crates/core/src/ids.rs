use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceheadError};

/// Number of leading hex digits shown next to the trace name.
pub const SHORT_ID_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanId(String);

impl TraceId {
    /// Accepts 64-bit and 128-bit ids; Jaeger emits both.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty()
            || trimmed.len() > 32
            || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(TraceheadError::Parse(format!("invalid trace id: {input}")));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self.0.len().min(SHORT_ID_LEN);
        &self.0[..end]
    }
}

impl SpanId {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty()
            || trimmed.len() > 16
            || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(TraceheadError::Parse(format!("invalid span id: {input}")));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids() {
        let trace = TraceId::parse("4BF92F3577B34DA6A3CE929D0E0E4736").unwrap();
        let span = SpanId::parse("00f067aa0ba902b7").unwrap();
        assert_eq!(trace.as_str(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(span.as_str(), "00f067aa0ba902b7");
    }

    #[test]
    fn accepts_64_bit_trace_ids() {
        let trace = TraceId::parse("a3ce929d0e0e4736").unwrap();
        assert_eq!(trace.short(), "a3ce929");
    }

    #[test]
    fn short_id_of_tiny_id_is_whole_id() {
        assert_eq!(TraceId::parse("abc").unwrap().short(), "abc");
    }

    #[test]
    fn rejects_bad_ids() {
        assert!(TraceId::parse("").is_err());
        assert!(TraceId::parse("not-hex").is_err());
        assert!(SpanId::parse("zzzzzzzzzzzzzzzz").is_err());
        assert!(SpanId::parse("00f067aa0ba902b7ff").is_err());
    }
}
