//! Types for the optional trace question-answering collaborator.
//!
//! The header never talks to an answering service itself; hosts that want
//! one implement the transport and feed results into a [`Conversation`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceheadError};
use crate::ids::TraceId;

pub const MAX_HOP: u8 = 3;
pub const DEFAULT_METHOD: &str = "graph-rag";
const GREETING: &str = "Ask away...";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
    pub hop: u8,
    pub trace_id: String,
    pub method: String,
}

impl AskRequest {
    pub fn new(trace_id: &TraceId, question: &str, hop: u8, method: &str) -> Result<Self> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TraceheadError::InvalidArgument(
                "question cannot be empty".to_string(),
            ));
        }
        if hop > MAX_HOP {
            return Err(TraceheadError::InvalidArgument(format!(
                "hop must be between 0 and {MAX_HOP}, got {hop}"
            )));
        }
        Ok(Self {
            question: question.to_string(),
            hop,
            trace_id: trace_id.as_str().to_string(),
            method: method.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Speaker {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatEntry {
    pub speaker: Speaker,
    pub content: String,
}

/// Append-only question/answer log, opened with a system greeting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    entries: Vec<ChatEntry>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            entries: vec![ChatEntry {
                speaker: Speaker::System,
                content: GREETING.to_string(),
            }],
        }
    }

    pub fn ask(&mut self, question: &str) {
        self.push(Speaker::User, question);
    }

    pub fn answer(&mut self, response: &AskResponse) {
        self.push(Speaker::System, &response.answer);
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    fn push(&mut self, speaker: Speaker, content: &str) {
        self.entries.push(ChatEntry {
            speaker,
            content: content.to_string(),
        });
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
