//! Shared pipeline state
//!
//! One typed context struct per run, passed by mutable reference between
//! pipeline stages. Slot names serialize to the exact external state keys.

use crate::models::{
    AdvisorsSummary, Domain, PerksSummary, PortfolioSummary, SpendingSummary, Topic,
};
use serde::{Deserialize, Serialize};

/// State shared across the steps of one user session/run.
///
/// Every slot is written at most once per pipeline run; the goals and
/// spending retrievers share the `spending_data` slot, last writer wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spending_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spending_summary: Option<SpendingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spending_chart: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub perks_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perks_summary: Option<PerksSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_summary: Option<PortfolioSummary>,

    #[serde(rename = "Advisors_data", skip_serializing_if = "Option::is_none")]
    pub advisors_data: Option<String>,
    #[serde(rename = "Advisors_summary", skip_serializing_if = "Option::is_none")]
    pub advisors_summary: Option<AdvisorsSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a retriever's combined text under the domain's data slot.
    pub fn record_retrieval(&mut self, domain: Domain, text: String) {
        match domain {
            Domain::Spending | Domain::Goals => self.spending_data = Some(text),
            Domain::Portfolio => self.portfolio_data = Some(text),
            Domain::Perks => self.perks_data = Some(text),
            Domain::Advisors => self.advisors_data = Some(text),
        }
    }

    /// Read the combined text a retriever wrote for the domain.
    pub fn retrieval(&self, domain: Domain) -> Option<&str> {
        match domain {
            Domain::Spending | Domain::Goals => self.spending_data.as_deref(),
            Domain::Portfolio => self.portfolio_data.as_deref(),
            Domain::Perks => self.perks_data.as_deref(),
            Domain::Advisors => self.advisors_data.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_slots_round_trip() {
        let mut state = SessionState::new();
        state.record_retrieval(Domain::Advisors, "meetings".to_string());
        state.record_retrieval(Domain::Perks, "benefits".to_string());

        assert_eq!(state.retrieval(Domain::Advisors), Some("meetings"));
        assert_eq!(state.retrieval(Domain::Perks), Some("benefits"));
        assert_eq!(state.retrieval(Domain::Spending), None);
    }

    #[test]
    fn test_goals_shares_spending_slot() {
        let mut state = SessionState::new();
        state.record_retrieval(Domain::Spending, "txns".to_string());
        state.record_retrieval(Domain::Goals, "goals".to_string());

        // Last writer wins on the shared slot.
        assert_eq!(state.retrieval(Domain::Spending), Some("goals"));
        assert_eq!(state.retrieval(Domain::Goals), Some("goals"));
    }

    #[test]
    fn test_external_key_spellings() {
        let mut state = SessionState::new();
        state.advisors_data = Some("data".to_string());
        state.advisors_summary = Some(crate::models::AdvisorsSummary {
            advisors: vec![],
            meetings: vec![],
        });
        state.spending_chart = Some("chart".to_string());

        let value = serde_json::to_value(&state).unwrap();
        let keys = value.as_object().unwrap();
        assert!(keys.contains_key("Advisors_data"));
        assert!(keys.contains_key("Advisors_summary"));
        assert!(keys.contains_key("spending_chart"));
        assert!(!keys.contains_key("advisors_data"));
    }
}
