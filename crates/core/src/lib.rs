//! Core types for the Cirrus function app.
//!
//! Everything in this crate is pure: name validation, response mapping,
//! blob metadata extraction, log line formatting, and streaming CSV
//! ingestion. Storage and transport live in other crates.

pub mod ingest;
pub mod metadata;
pub mod response;
pub mod validation;

pub use ingest::{CsvIngestor, CsvRecord, IngestError, Utf8ChunkDecoder, ingest};
pub use metadata::{BlobMetadata, BlobUploadEvent, MalformedUploadEvent, MetadataLogEntry};
pub use response::{FunctionResponse, greeting, respond, static_greeting};
pub use validation::{InvalidReason, MAX_NAME_CHARS, ValidationResult, validate_name};
