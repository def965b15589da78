//! Bank connector trait and implementations
//!
//! The remote bank agent exposes exactly one capability: accept a free-text
//! query, return a textual result. Everything that talks to it goes through
//! the `BankConnector` trait so specialists, retrievers and tests share one
//! call site shape.

use crate::Result;
use std::sync::Mutex;

pub mod a2a;
pub use a2a::RemoteBankConnector;

/// Single-capability interface to the remote banking-data agent.
#[async_trait::async_trait]
pub trait BankConnector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn invoke(&self, query: &str) -> Result<String>;
}

/// Scripted connector for development and tests.
///
/// Replies are selected by substring match against the query; the full
/// ordered call sequence is recorded so tests can assert query order.
pub struct MockBankConnector {
    responses: Vec<(String, String)>,
    failures: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl MockBankConnector {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `reply` for any query containing `needle`.
    pub fn with_response(mut self, needle: &str, reply: &str) -> Self {
        self.responses.push((needle.to_string(), reply.to_string()));
        self
    }

    /// Fail any query containing `needle`.
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.failures.push(needle.to_string());
        self
    }

    /// Ordered queries received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock connector lock poisoned").clone()
    }
}

impl Default for MockBankConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BankConnector for MockBankConnector {
    fn name(&self) -> &'static str {
        "mock_bank_agent"
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        self.calls
            .lock()
            .expect("mock connector lock poisoned")
            .push(query.to_string());

        if self.failures.iter().any(|needle| query.contains(needle)) {
            return Err(crate::error::AgentError::Connector(format!(
                "scripted failure for query {:?}",
                query
            )));
        }

        for (needle, reply) in &self.responses {
            if query.contains(needle) {
                return Ok(reply.clone());
            }
        }

        Ok(format!("No records found for: {}", query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_call_order() {
        let connector = MockBankConnector::new()
            .with_response("meetings", "Meeting with Dana, Tuesday 10:00")
            .with_response("advisors", "Dana Reeve - Wealth - Tue/Thu");

        connector.invoke("List my meetings.").await.unwrap();
        connector.invoke("List the advisors.").await.unwrap();
        connector.invoke("Get my user profile").await.unwrap();

        assert_eq!(
            connector.calls(),
            vec![
                "List my meetings.".to_string(),
                "List the advisors.".to_string(),
                "Get my user profile".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let connector = MockBankConnector::new().failing_on("benefits");
        let result = connector.invoke("List my benefits.").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_fallback_reply() {
        let connector = MockBankConnector::new();
        let reply = connector.invoke("List the bank partners.").await.unwrap();
        assert!(reply.contains("List the bank partners."));
    }
}
