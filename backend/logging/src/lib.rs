//! Structured logging components for mdforge.
//!
//! Handles subscriber setup (console plus rolling NDJSON file), log
//! redaction, and the editor operation log.

pub mod logger;
pub mod op_logger;
pub mod redact;

pub use logger::init_logger;
pub use op_logger::{excerpt, EditorOperation, OpLogEntry, OperationLogger, OPS_TARGET};
pub use redact::redact_sensitive_data;
