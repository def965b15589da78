//! Error types for the banking assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Agent discovery error: {0}")]
    Discovery(String),

    #[error("Bank connector error: {0}")]
    Connector(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Structured output violated the {schema} schema: {detail}")]
    SchemaViolation { schema: &'static str, detail: String },

    #[error("Retrieval produced no data for {0}")]
    EmptyRetrieval(&'static str),

    #[error("Unrecognized topic: {0:?}")]
    UnknownTopic(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Audit error: {0}")]
    Audit(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
