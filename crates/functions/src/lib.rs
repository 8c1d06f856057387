//! Function handlers for the Cirrus app.
//!
//! The two HTTP functions are thin wrappers over `cirrus-core`. The
//! metadata-log function appends one line per upload to a shared log blob
//! through [`MetadataLogAppender`], which uses ETag-conditional writes so
//! concurrent invocations do not lose lines. The CSV function parses an
//! upload and only logs what it finds.

pub mod appender;
pub mod best_effort;
pub mod handlers;

#[cfg(test)]
mod test_support;

pub use appender::{AppendConfig, AppendError, AppendReport, MetadataLogAppender};
pub use best_effort::BestEffort;
pub use handlers::{
    InvocationSummary, MetadataLogFunction, first_http_function, ingest_csv_upload,
    second_http_function,
};
