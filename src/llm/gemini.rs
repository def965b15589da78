//! Gemini API client
//!
//! Direct integration with the Generative Language REST API.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::AgentError;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        response_schema: Option<&Value>,
    ) -> Result<(String, f32)> {
        if self.api_key.is_empty() {
            return Err(AgentError::Llm("GEMINI_API_KEY not configured".to_string()));
        }

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
                response_mime_type: response_schema.map(|_| "application/json".to_string()),
                response_schema: response_schema.cloned(),
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
        };

        info!(model = %model, structured = response_schema.is_some(), "Calling Gemini API");

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!("Gemini API request failed: {}", e);
            AgentError::Llm(format!("Gemini API error: {}", e))
        })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(AgentError::Llm(format!("Gemini API error: {}", error_text)));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            AgentError::Llm(format!("Gemini parse error: {}", e))
        })?;

        if gemini_response.candidates.is_empty() {
            return Err(AgentError::Llm("No response from Gemini API".to_string()));
        }

        let answer = gemini_response.candidates[0]
            .content
            .parts
            .first()
            .ok_or_else(|| AgentError::Llm("Empty response from Gemini".to_string()))?
            .text
            .clone();

        let confidence = calculate_confidence(&gemini_response);

        info!("Gemini response received (confidence: {})", confidence);

        Ok((answer, confidence))
    }
}

#[async_trait::async_trait]
impl super::Llm for GeminiClient {
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<(String, f32)> {
        self.generate_content(model, system, prompt, None).await
    }

    async fn generate_structured(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<Value> {
        let (answer, _confidence) = self
            .generate_content(model, system, prompt, Some(response_schema))
            .await?;

        parse_json_reply(&answer)
    }
}

/// Parse a JSON reply, tolerating markdown fences the model sometimes adds
/// around otherwise valid payloads.
fn parse_json_reply(answer: &str) -> Result<Value> {
    let cleaned = answer
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(cleaned).map_err(|e| {
        AgentError::Llm(format!(
            "Failed to parse structured Gemini reply: {} | raw={}",
            e, answer
        ))
    })
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
    finish_reason: Option<String>,
}

/// Calculate response confidence
fn calculate_confidence(response: &GeminiResponse) -> f32 {
    let base_confidence: f32 = 0.85;

    let finish_confidence = match response.candidates[0].finish_reason.as_deref() {
        Some("STOP") => 1.0,
        Some("LENGTH") => 0.8,
        Some("SAFETY") => 0.6,
        _ => 0.7,
    };

    let response_length = response.candidates[0]
        .content
        .parts
        .first()
        .map(|p| p.text.len())
        .unwrap_or(0);

    let length_confidence = if response_length < 50 {
        0.6
    } else if response_length > 2000 {
        0.8
    } else {
        1.0
    };

    (base_confidence * finish_confidence * length_confidence)
        .min(0.98)
        .max(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Summary, SpendingSummary};

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "Summarize my spending".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(SpendingSummary::response_schema()),
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "You are an expert financial analyst".to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("Summarize my spending"));
        assert!(json.contains("response_schema"));
        assert!(json.contains("application/json"));
    }

    #[test]
    fn test_plain_generation_omits_schema_fields() {
        let config = GenerationConfig {
            temperature: 0.3,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 2048,
            response_mime_type: None,
            response_schema: None,
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("response_schema"));
        assert!(!json.contains("response_mime_type"));
    }

    #[test]
    fn test_parse_json_reply_strips_fences() {
        let fenced = "```json\n{ \"income\": 10.0 }\n```";
        let value = parse_json_reply(fenced).unwrap();
        assert_eq!(value["income"], 10.0);

        assert!(parse_json_reply("not json at all").is_err());
    }
}
