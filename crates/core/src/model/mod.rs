pub mod process;
pub mod span;
pub mod trace;

pub use process::Process;
pub use span::{RefType, Span, SpanReference};
pub use trace::Trace;
