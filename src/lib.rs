//! Cymbal Banking Assistant
//!
//! A banking assistant that composes a remote bank-data agent (reached via
//! A2A agent-card discovery) with the Gemini API into:
//! - five snapshot pipelines (RETRIEVE → FORMAT) producing schema-typed
//!   domain summaries
//! - a topic-routed chat orchestrator delegating each turn to one of five
//!   domain specialists
//!
//! Control flow is explicit: retrievers execute fixed, ordered query lists;
//! pipeline stages pass a typed `SessionState` by reference; tool dispatch
//! goes through the single-capability `BankConnector` trait.

pub mod api;
pub mod audit;
pub mod chat;
pub mod connector;
pub mod error;
pub mod formatter;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod retriever;
pub mod state;

pub use error::Result;

// Re-export common types
pub use connector::{BankConnector, MockBankConnector, RemoteBankConnector};
pub use llm::{GeminiClient, Llm, MockLlm};
pub use models::*;
pub use pipeline::{build_pipelines, Pipelines, SnapshotPipeline};
pub use state::SessionState;
