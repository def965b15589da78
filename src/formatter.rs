//! Formatter agents
//!
//! Each formatter reads the combined text its domain retriever produced and
//! writes exactly one summary slot: four domains produce schema-typed
//! summaries through constrained decoding, the goals domain produces a
//! free-text chart description.

use crate::llm::Llm;
use crate::models::{
    AdvisorsSummary, AgentProfile, PerksSummary, PortfolioSummary, SpendingSummary, Summary,
    DEFAULT_MODEL,
};
use crate::state::SessionState;
use crate::Result;
use serde_json::Value;
use tracing::{debug, warn};

#[async_trait::async_trait]
pub trait Formatter: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    /// Format the retrieved text into the domain's summary slot, returning
    /// the summary as a JSON value for the pipeline outcome.
    async fn format(&self, llm: &dyn Llm, data: &str, state: &mut SessionState) -> Result<Value>;
}

/// Ask the model for a schema-constrained summary and parse it into the
/// typed struct. A non-conformant reply is retried once before failing.
async fn structured_summary<S: Summary>(
    llm: &dyn Llm,
    profile: &AgentProfile,
    data: &str,
) -> Result<S> {
    let schema = S::response_schema();
    let prompt = format!("Retrieved data:\n\n{}", data);

    for attempt in 0..2 {
        let value = llm
            .generate_structured(profile.model, profile.instruction, &prompt, &schema)
            .await?;

        match serde_json::from_value::<S>(value) {
            Ok(summary) => {
                debug!(agent = profile.name, schema = S::NAME, attempt, "Summary formatted");
                return Ok(summary);
            }
            Err(e) if attempt == 0 => {
                warn!(
                    agent = profile.name,
                    schema = S::NAME,
                    error = %e,
                    "Structured reply did not conform, retrying once"
                );
            }
            Err(e) => {
                return Err(crate::error::AgentError::SchemaViolation {
                    schema: S::NAME,
                    detail: e.to_string(),
                });
            }
        }
    }

    unreachable!("structured_summary loop returns on every branch")
}

//
// ================= Domain Formatters =================
//

pub struct SpendingFormatter {
    profile: AgentProfile,
}

impl SpendingFormatter {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile {
                name: "spending_formatter",
                model: DEFAULT_MODEL,
                description: "Analyzes spending data and generates structured financial insights",
                instruction: "You are an expert financial analyst. Using the spending data and user profile below, analyze the information and provide structured insights.\n\
                    1. Activities: list the 5 most recent transactions (format: \"Date - Merchant - Amount\")\n\
                    2. Income: calculate total income from transactions (payrolls, salary deposits, refunds, etc.)\n\
                    3. Expenses: calculate total expenses from transactions (purchases, bills, rent, groceries, etc.)\n\
                    4. Insights: analyze spending patterns against the user's goals from their profile; be specific and actionable.\n\
                    Return a structured JSON response that matches the SpendingSummary schema exactly.",
            },
        }
    }
}

impl Default for SpendingFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Formatter for SpendingFormatter {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn format(&self, llm: &dyn Llm, data: &str, state: &mut SessionState) -> Result<Value> {
        let summary: SpendingSummary = structured_summary(llm, &self.profile, data).await?;
        let value = serde_json::to_value(&summary)?;
        state.spending_summary = Some(summary);
        Ok(value)
    }
}

/// The goals pipeline has no structured schema; it renders a chart
/// description of the user's progress as free text.
pub struct GoalsChartFormatter {
    profile: AgentProfile,
}

impl GoalsChartFormatter {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile {
                name: "spending_chart_agent",
                model: DEFAULT_MODEL,
                description: "Create a chart of the users spending",
                instruction: "You are an expert chart architect. Using the goals and profile data below, describe a chart of the user's savings progress toward each goal: axes, series and the values to plot.",
            },
        }
    }
}

impl Default for GoalsChartFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Formatter for GoalsChartFormatter {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn format(&self, llm: &dyn Llm, data: &str, state: &mut SessionState) -> Result<Value> {
        let prompt = format!("Retrieved data:\n\n{}", data);
        let (chart, _confidence) = llm
            .generate(self.profile.model, self.profile.instruction, &prompt)
            .await?;

        state.spending_chart = Some(chart.clone());
        Ok(Value::String(chart))
    }
}

pub struct PortfolioFormatter {
    profile: AgentProfile,
}

impl PortfolioFormatter {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile {
                name: "portfolio_formatter",
                model: DEFAULT_MODEL,
                description: "Analyzes user's portfolio data and generates structured financial insights",
                instruction: "You are an expert financial analyst. Using the portfolio data and user profile below, analyze the information and provide structured insights.\n\
                    1. Debts: list user's debts (format: \"Debt Type - Amount - Interest Rate\")\n\
                    2. Investments: list user's investments (format: \"Investment Type - Amount - Performance\")\n\
                    3. Net Worth: list net worth calculations (format: \"Assets - Liabilities = Net Worth\")\n\
                    4. Cashflow: list cashflow items (format: \"Income Source/Expense - Amount - Frequency\")\n\
                    5. Average Cashflow: list average cashflow calculations (format: \"Monthly Average - Yearly Projection\")\n\
                    6. Insights: analyze portfolio health, investment performance, debt management and goal alignment.\n\
                    Return a structured JSON response that matches the PortfolioSummary schema exactly, with calculations based on the available portfolio data.",
            },
        }
    }
}

impl Default for PortfolioFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Formatter for PortfolioFormatter {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn format(&self, llm: &dyn Llm, data: &str, state: &mut SessionState) -> Result<Value> {
        let summary: PortfolioSummary = structured_summary(llm, &self.profile, data).await?;
        let value = serde_json::to_value(&summary)?;
        state.portfolio_summary = Some(summary);
        Ok(value)
    }
}

pub struct PerksFormatter {
    profile: AgentProfile,
}

impl PerksFormatter {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile {
                name: "perks_formatter",
                model: DEFAULT_MODEL,
                description: "Analyzes user's benefits data and generates structured financial insights",
                instruction: "You are an expert financial analyst. Using the user benefits data, bank partners and user profile below, analyze the information and provide structured insights.\n\
                    1. Your Benefits: list the user benefits category wise (format: \"Name - Category - Benefit Type - Benefit Value\")\n\
                    2. Your Bank Partners: list the bank's partners\n\
                    3. Insights: financial insights based on the user's benefits.\n\
                    Return a structured JSON response that matches the PerksSummary schema exactly.",
            },
        }
    }
}

impl Default for PerksFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Formatter for PerksFormatter {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn format(&self, llm: &dyn Llm, data: &str, state: &mut SessionState) -> Result<Value> {
        let summary: PerksSummary = structured_summary(llm, &self.profile, data).await?;
        let value = serde_json::to_value(&summary)?;
        state.perks_summary = Some(summary);
        Ok(value)
    }
}

pub struct AdvisorsFormatter {
    profile: AgentProfile,
}

impl AdvisorsFormatter {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile {
                name: "Advisors_formatter",
                model: DEFAULT_MODEL,
                description: "Analyzes user's advisor and meeting data and generates structured summary",
                instruction: "You are an expert financial analyst. Using the user meeting data, advisor data and user profile below, analyze the information and provide structured insights.\n\
                    1. Your Meetings: list the user's scheduled meetings (format: \"Date - Time - Advisor - Purpose\")\n\
                    2. Your Advisors: list the bank's advisors with availability, sorted by advisor type.\n\
                    Return a structured JSON response that matches the AdvisorsSummary schema exactly.",
            },
        }
    }
}

impl Default for AdvisorsFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Formatter for AdvisorsFormatter {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn format(&self, llm: &dyn Llm, data: &str, state: &mut SessionState) -> Result<Value> {
        let summary: AdvisorsSummary = structured_summary(llm, &self.profile, data).await?;
        let value = serde_json::to_value(&summary)?;
        state.advisors_summary = Some(summary);
        Ok(value)
    }
}
