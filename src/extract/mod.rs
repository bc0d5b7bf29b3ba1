pub mod extractor;
pub mod parser;
pub mod schema;
pub mod timeline;
pub mod validate;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Extraction validation failed: {0}")]
    Validation(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] crate::generation::GenerationError),
}
