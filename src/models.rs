//! Core data models for the banking assistant

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

//
// ================= Domains & Topics =================
//

/// Banking domain served by one snapshot pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Spending,
    Goals,
    Portfolio,
    Perks,
    Advisors,
}

impl Domain {
    /// State key the domain's retriever writes its combined text under.
    /// The goals pipeline shares the spending slot, matching the external
    /// state-key contract.
    pub fn data_key(&self) -> &'static str {
        match self {
            Domain::Spending | Domain::Goals => "spending_data",
            Domain::Portfolio => "portfolio_data",
            Domain::Perks => "perks_data",
            Domain::Advisors => "Advisors_data",
        }
    }

    pub fn pipeline_name(&self) -> &'static str {
        match self {
            Domain::Spending => "spending_snapshot_pipeline",
            Domain::Goals => "goals_snapshot_pipeline",
            Domain::Portfolio => "portfolio_snapshot_pipeline",
            Domain::Perks => "perks_snapshot_pipeline",
            Domain::Advisors => "Advisors_snapshot_pipeline",
        }
    }

    pub fn parse(value: &str) -> Option<Domain> {
        match value {
            "spending" => Some(Domain::Spending),
            "goals" => Some(Domain::Goals),
            "portfolio" => Some(Domain::Portfolio),
            "perks" => Some(Domain::Perks),
            "advisors" => Some(Domain::Advisors),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Domain::Spending => "spending",
            Domain::Goals => "goals",
            Domain::Portfolio => "portfolio",
            Domain::Perks => "perks",
            Domain::Advisors => "advisors",
        };
        write!(f, "{}", s)
    }
}

/// External routing signal consumed by the chat orchestrator.
///
/// Parsing is exact-match over the five domain strings; anything else is an
/// error the orchestrator surfaces as `AgentError::UnknownTopic`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Spending,
    Goals,
    Portfolio,
    Perks,
    Advisors,
}

impl Topic {
    pub fn domain(&self) -> Domain {
        match self {
            Topic::Spending => Domain::Spending,
            Topic::Goals => Domain::Goals,
            Topic::Portfolio => Domain::Portfolio,
            Topic::Perks => Domain::Perks,
            Topic::Advisors => Domain::Advisors,
        }
    }
}

impl std::str::FromStr for Topic {
    type Err = crate::error::AgentError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "spending" => Ok(Topic::Spending),
            "goals" => Ok(Topic::Goals),
            "portfolio" => Ok(Topic::Portfolio),
            "perks" => Ok(Topic::Perks),
            "advisors" => Ok(Topic::Advisors),
            other => Err(crate::error::AgentError::UnknownTopic(other.to_string())),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.domain())
    }
}

//
// ================= Agent Configuration =================
//

/// Immutable configuration of one agent: built at process start, held for
/// the process lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct AgentProfile {
    pub name: &'static str,
    pub model: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
}

/// Model id used by every agent in this deployment.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

//
// ================= Structured Output Schemas =================
//

/// A schema-typed summary a formatter agent produces.
///
/// Field names and types of the implementing structs are the bit-exact
/// contract external consumers match; `response_schema` is the same shape
/// expressed for the model's constrained-decoding API.
pub trait Summary: Serialize + DeserializeOwned + Send + Sync {
    /// Schema name, used in error reporting.
    const NAME: &'static str;
    /// State key the summary is written under.
    const STATE_KEY: &'static str;

    fn response_schema() -> Value;
}

/// Structured output for spending analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpendingSummary {
    /// List of 5 most recent transactions
    pub activities: Vec<String>,
    /// Total income amount from transactions
    pub income: f64,
    /// Total expenses amount from transactions
    pub expenses: f64,
    /// Financial insights based on user goals and spending patterns
    pub insights: String,
}

impl Summary for SpendingSummary {
    const NAME: &'static str = "SpendingSummary";
    const STATE_KEY: &'static str = "spending_summary";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "activities": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of 5 most recent transactions"
                },
                "income": {
                    "type": "NUMBER",
                    "description": "Total income amount from transactions"
                },
                "expenses": {
                    "type": "NUMBER",
                    "description": "Total expenses amount from transactions"
                },
                "insights": {
                    "type": "STRING",
                    "description": "Financial insights based on user goals and spending patterns"
                }
            },
            "required": ["activities", "income", "expenses", "insights"]
        })
    }
}

/// Structured output for advisors and meetings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisorsSummary {
    /// List of advisors with their availability, sorted by advisor type
    pub advisors: Vec<String>,
    /// List of the user's meetings
    pub meetings: Vec<String>,
}

impl Summary for AdvisorsSummary {
    const NAME: &'static str = "AdvisorsSummary";
    const STATE_KEY: &'static str = "Advisors_summary";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "advisors": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of advisors with the availability sorted by advisor_type"
                },
                "meetings": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user's meetings"
                }
            },
            "required": ["advisors", "meetings"]
        })
    }
}

/// Structured output for perks analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerksSummary {
    /// List of user benefits by category
    pub activities: Vec<String>,
    /// List of the bank's partners
    pub partners: Vec<String>,
    /// Financial insights based on the user's benefits
    pub insights: String,
}

impl Summary for PerksSummary {
    const NAME: &'static str = "PerksSummary";
    const STATE_KEY: &'static str = "perks_summary";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "activities": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user benefits by category"
                },
                "partners": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of bank's partners"
                },
                "insights": {
                    "type": "STRING",
                    "description": "Financial insights based on user's benefits"
                }
            },
            "required": ["activities", "partners", "insights"]
        })
    }
}

/// Structured output for portfolio analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    /// List of user debts
    pub debts: Vec<String>,
    /// List of user investments
    pub investments: Vec<String>,
    /// List of user net-worth calculations
    pub networth: Vec<String>,
    /// List of user cashflow items
    pub cashflow: Vec<String>,
    /// List of user average-cashflow calculations
    pub average_cashflow: Vec<String>,
    /// Financial insights across debts, investments, net worth and cashflow
    pub insights: String,
}

impl Summary for PortfolioSummary {
    const NAME: &'static str = "PortfolioSummary";
    const STATE_KEY: &'static str = "portfolio_summary";

    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "debts": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user debts"
                },
                "investments": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user investments"
                },
                "networth": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user networth"
                },
                "cashflow": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user cashflow"
                },
                "average_cashflow": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "List of user average_cashflow"
                },
                "insights": {
                    "type": "STRING",
                    "description": "Financial insights based on user's debts, investments, networth, cashflow, average_cashflow and profile"
                }
            },
            "required": ["debts", "investments", "networth", "cashflow", "average_cashflow", "insights"]
        })
    }
}

//
// ================= Step Traces =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
}

/// Record of one remote query issued by a retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTrace {
    pub query: String,
    pub status: StepStatus,
    pub elapsed_ms: u64,
}

//
// ================= Pipeline Outcome =================
//

/// Terminal result of one snapshot pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotOutcome {
    pub run_id: Uuid,
    pub pipeline: &'static str,
    pub domain: Domain,
    pub summary: Value,
    pub steps: Vec<StepTrace>,
    pub elapsed_ms: u64,
}

//
// ================= Chat =================
//

/// Free-text answer produced by a domain specialist.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub topic: Topic,
    pub specialist: &'static str,
    pub confidence: f32,
}

//
// ================= Run Record =================
//

/// Audit entry for a completed snapshot run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub pipeline: &'static str,
    pub domain: Domain,
    /// SHA-256 of the retrieved text the formatter consumed.
    pub input_hash: String,
    pub summary: Value,
    pub steps: Arc<Vec<StepTrace>>,
    pub created_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_topic_exact_match() {
        assert_eq!(Topic::from_str("goals").unwrap(), Topic::Goals);
        assert_eq!(Topic::from_str("advisors").unwrap(), Topic::Advisors);
        assert!(Topic::from_str("taxes").is_err());
        assert!(Topic::from_str("Goals").is_err());
        assert!(Topic::from_str("").is_err());
    }

    #[test]
    fn test_domain_data_keys() {
        assert_eq!(Domain::Spending.data_key(), "spending_data");
        assert_eq!(Domain::Goals.data_key(), "spending_data");
        assert_eq!(Domain::Advisors.data_key(), "Advisors_data");
        assert_eq!(Domain::Perks.data_key(), "perks_data");
        assert_eq!(Domain::Portfolio.data_key(), "portfolio_data");
    }

    #[test]
    fn test_spending_summary_shape() {
        let raw = serde_json::json!({
            "activities": ["2025-01-02 - Groceries - $54.10"],
            "income": 4200.0,
            "expenses": 1880.5,
            "insights": "Spending is on track."
        });

        let summary: SpendingSummary = serde_json::from_value(raw).unwrap();
        assert_eq!(summary.activities.len(), 1);
        assert_eq!(summary.income, 4200.0);

        // Missing a required field must fail to parse.
        let incomplete = serde_json::json!({
            "activities": [],
            "income": 0.0,
            "insights": "x"
        });
        assert!(serde_json::from_value::<SpendingSummary>(incomplete).is_err());
    }

    #[test]
    fn test_response_schemas_cover_all_fields() {
        for (schema, fields) in [
            (
                SpendingSummary::response_schema(),
                vec!["activities", "income", "expenses", "insights"],
            ),
            (
                AdvisorsSummary::response_schema(),
                vec!["advisors", "meetings"],
            ),
            (
                PerksSummary::response_schema(),
                vec!["activities", "partners", "insights"],
            ),
            (
                PortfolioSummary::response_schema(),
                vec![
                    "debts",
                    "investments",
                    "networth",
                    "cashflow",
                    "average_cashflow",
                    "insights",
                ],
            ),
        ] {
            let properties = schema.get("properties").unwrap().as_object().unwrap();
            let required = schema.get("required").unwrap().as_array().unwrap();
            assert_eq!(properties.len(), fields.len());
            assert_eq!(required.len(), fields.len());
            for field in fields {
                assert!(properties.contains_key(field));
            }
        }
    }
}
