//! Remote bank agent reached over the A2A protocol
//!
//! The agent is discovered through its well-known agent-card document; the
//! card's service endpoint then receives free-text queries as JSON-RPC 2.0
//! `message/send` requests.

use crate::error::AgentError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

/// Well-known discovery document for the Cymbal bank agent.
pub const DEFAULT_AGENT_CARD_URL: &str =
    "https://agent.ai-agent-bakeoff.com/.well-known/agent-card.json";

const JSONRPC_VERSION: &str = "2.0";

/// Subset of the A2A agent card this client needs: identity plus the
/// service endpoint URL all requests go to.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentCard {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Client for the remote Cymbal bank agent.
///
/// Card resolution is lazy and happens once per process; the resolved
/// endpoint is reused for every subsequent query.
pub struct RemoteBankConnector {
    client: Client,
    card_url: String,
    card: OnceCell<AgentCard>,
    request_id: AtomicU64,
}

impl RemoteBankConnector {
    pub fn new(card_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            card_url: card_url.into(),
            card: OnceCell::new(),
            request_id: AtomicU64::new(1),
        }
    }

    /// Build from `BANK_AGENT_CARD_URL`, falling back to the well-known
    /// Cymbal discovery URL.
    pub fn from_env() -> Self {
        let card_url =
            env::var("BANK_AGENT_CARD_URL").unwrap_or_else(|_| DEFAULT_AGENT_CARD_URL.to_string());
        Self::new(card_url)
    }

    async fn resolve_card(&self) -> Result<&AgentCard> {
        self.card
            .get_or_try_init(|| async {
                debug!(card_url = %self.card_url, "Fetching agent card");

                let response = self
                    .client
                    .get(&self.card_url)
                    .header("Accept", "application/json")
                    .send()
                    .await
                    .map_err(|e| {
                        AgentError::Discovery(format!(
                            "Failed to fetch agent card from {}: {}",
                            self.card_url, e
                        ))
                    })?;

                if !response.status().is_success() {
                    return Err(AgentError::Discovery(format!(
                        "Agent card fetch returned HTTP {}",
                        response.status()
                    )));
                }

                let card: AgentCard = response.json().await.map_err(|e| {
                    AgentError::Discovery(format!("Failed to parse agent card: {}", e))
                })?;

                if card.url.is_empty() {
                    return Err(AgentError::Discovery(
                        "Agent card does not contain a service endpoint URL".to_string(),
                    ));
                }

                info!(agent = %card.name, endpoint = %card.url, "Resolved remote bank agent");
                Ok(card)
            })
            .await
    }

    fn build_message_params(query: &str) -> Value {
        json!({
            "message": {
                "kind": "message",
                "role": "user",
                "messageId": Uuid::new_v4().to_string(),
                "parts": [
                    { "kind": "text", "text": query }
                ]
            }
        })
    }
}

#[async_trait::async_trait]
impl super::BankConnector for RemoteBankConnector {
    fn name(&self) -> &'static str {
        "cymbal_agent"
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        let card = self.resolve_card().await?;

        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method: "message/send",
            params: Self::build_message_params(query),
        };

        debug!(query = %query, endpoint = %card.url, "Querying remote bank agent");

        let response = self
            .client
            .post(&card.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Connector(format!("message/send failed: {}", e)))?;

        let status = response.status();
        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Connector(format!("Invalid JSON-RPC response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(AgentError::Connector(format!(
                "Remote agent error {}: {}",
                error.code, error.message
            )));
        }

        let result = body.result.ok_or_else(|| {
            AgentError::Connector(format!(
                "Remote agent returned HTTP {} with neither result nor error",
                status
            ))
        })?;

        let text = extract_text(&result);
        if text.is_empty() {
            return Err(AgentError::Connector(
                "Remote agent reply contained no text parts".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Collect the text parts of a `message/send` result.
///
/// The result is either a message (top-level `parts`) or a task whose
/// output lives in `artifacts[].parts` and `status.message.parts`.
fn extract_text(result: &Value) -> String {
    let mut sections = Vec::new();

    collect_parts(result.get("parts"), &mut sections);

    if let Some(artifacts) = result.get("artifacts").and_then(Value::as_array) {
        for artifact in artifacts {
            collect_parts(artifact.get("parts"), &mut sections);
        }
    }

    collect_parts(result.pointer("/status/message/parts"), &mut sections);

    sections.join("\n")
}

fn collect_parts(parts: Option<&Value>, sections: &mut Vec<String>) {
    let Some(parts) = parts.and_then(Value::as_array) else {
        return;
    };

    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                sections.push(text.to_string());
            }
        }
    }
}
