//! Getting typed data out of model output
//!
//! - [`structured`]: one model call with a declared schema, typed result or typed failure
//! - [`json_block`]: locating and parsing a JSON block inside free text

pub mod json_block;
pub mod structured;

pub use json_block::{BlockSource, JsonBlock, JsonBlockResult};
pub use structured::{
    descriptor_for, parse_structured, ExtractionError, StructuredExtractor, StructuredOutput,
};
