pub mod ask;
pub mod config;
pub mod error;
pub mod format;
pub mod header;
pub mod ids;
pub mod jaeger;
pub mod model;
pub mod summary;
pub mod view;
pub mod view_range;

pub use error::{Result, TraceheadError};
