//! Structured logging setup and ndjson audit lines.

mod format;

pub use format::{StructuredLogger, VerdictLine};
