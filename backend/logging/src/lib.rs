//! Structured logging for docsift.
//!
//! Console output goes to stderr so stdout stays clean for JSON results.
//! An optional directory receives daily rolling NDJSON files.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LogFormat, LoggingOptions};
pub use redact::redact_sensitive_data;
