//! Language-model seam
//!
//! Agents talk to the hosted model through the `Llm` trait so pipelines can
//! run against the Gemini API in production and a deterministic mock in
//! development and tests.

use crate::Result;
use serde_json::{json, Value};
use std::sync::Mutex;

pub mod gemini;
pub use gemini::GeminiClient;

#[async_trait::async_trait]
pub trait Llm: Send + Sync {
    /// Free-text generation. Returns the answer and a confidence estimate.
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<(String, f32)>;

    /// Schema-constrained generation. The reply must be a JSON value
    /// conforming to `response_schema`.
    async fn generate_structured(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<Value>;
}

/// Deterministic model for development & testing.
///
/// Free-text calls echo a canned answer; structured calls synthesize a
/// schema-conformant stub (or pop a scripted reply). Every prompt is
/// recorded so tests can assert what a formatter actually received.
pub struct MockLlm {
    answer: String,
    prompts: Mutex<Vec<String>>,
    scripted_structured: Mutex<Vec<Value>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            answer: "Mock model answer.".to_string(),
            prompts: Mutex::new(Vec::new()),
            scripted_structured: Mutex::new(Vec::new()),
        }
    }

    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answer = answer.to_string();
        self
    }

    /// Queue a reply for the next structured call instead of synthesizing
    /// one from the schema. Replies are consumed in FIFO order.
    pub fn with_structured_reply(self, reply: Value) -> Self {
        self.scripted_structured
            .lock()
            .expect("mock llm lock poisoned")
            .push(reply);
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock llm lock poisoned").clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Llm for MockLlm {
    async fn generate(&self, _model: &str, _system: &str, prompt: &str) -> Result<(String, f32)> {
        self.prompts
            .lock()
            .expect("mock llm lock poisoned")
            .push(prompt.to_string());
        Ok((self.answer.clone(), 0.9))
    }

    async fn generate_structured(
        &self,
        _model: &str,
        _system: &str,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<Value> {
        self.prompts
            .lock()
            .expect("mock llm lock poisoned")
            .push(prompt.to_string());

        let mut scripted = self
            .scripted_structured
            .lock()
            .expect("mock llm lock poisoned");
        if !scripted.is_empty() {
            return Ok(scripted.remove(0));
        }

        Ok(stub_from_schema(response_schema))
    }
}

/// Build a minimal value conforming to a Gemini-style response schema.
fn stub_from_schema(schema: &Value) -> Value {
    match schema.get("type").and_then(Value::as_str) {
        Some("OBJECT") => {
            let mut object = serde_json::Map::new();
            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                for (field, field_schema) in properties {
                    object.insert(field.clone(), stub_from_schema(field_schema));
                }
            }
            Value::Object(object)
        }
        Some("ARRAY") => {
            let item = schema
                .get("items")
                .map(stub_from_schema)
                .unwrap_or(Value::Null);
            json!([item])
        }
        Some("STRING") => json!("mock value"),
        Some("NUMBER") => json!(0.0),
        Some("INTEGER") => json!(0),
        Some("BOOLEAN") => json!(false),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SpendingSummary, Summary};

    #[tokio::test]
    async fn test_stub_conforms_to_spending_schema() {
        let llm = MockLlm::new();
        let value = llm
            .generate_structured(
                "gemini-2.5-flash",
                "system",
                "prompt",
                &SpendingSummary::response_schema(),
            )
            .await
            .unwrap();

        let summary: SpendingSummary = serde_json::from_value(value).unwrap();
        assert_eq!(summary.activities.len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_structured_reply_takes_priority() {
        let llm = MockLlm::new().with_structured_reply(json!({ "not": "conformant" }));
        let value = llm
            .generate_structured(
                "gemini-2.5-flash",
                "system",
                "prompt",
                &SpendingSummary::response_schema(),
            )
            .await
            .unwrap();
        assert_eq!(value, json!({ "not": "conformant" }));
    }

    #[tokio::test]
    async fn test_prompts_are_recorded() {
        let llm = MockLlm::new();
        llm.generate("gemini-2.5-flash", "system", "first").await.unwrap();
        llm.generate("gemini-2.5-flash", "system", "second").await.unwrap();
        assert_eq!(llm.prompts(), vec!["first".to_string(), "second".to_string()]);
    }
}
