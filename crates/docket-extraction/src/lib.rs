//! Docket extraction – turns an invoice document into [`ExtractedFields`].
//!
//! [`ExtractionClient`] is the seam to the external model: it sends the raw
//! document with a fixed instruction and response schema and returns the
//! model's text. [`parse_extraction`] converts that text into typed fields,
//! degrading to all-null on anything it cannot read.
//!
//! [`ExtractedFields`]: docket_core::models::ExtractedFields

mod client;
mod error;
mod gemini;
mod parser;
mod prompt;

pub use client::ExtractionClient;
pub use error::ExtractionError;
pub use gemini::GeminiClient;
pub use parser::{parse_extraction, ParseOutcome};
pub use prompt::{response_schema, EXTRACTION_FIELDS, EXTRACTION_INSTRUCTION};
