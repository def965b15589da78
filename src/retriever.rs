//! Retriever agents
//!
//! Each domain retriever issues a fixed, ordered sequence of queries to the
//! remote bank agent and concatenates the labelled results into one combined
//! text for the formatter stage. The sequence is data, not model-interpreted
//! prose: wording and order never depend on prior results.

use crate::connector::BankConnector;
use crate::models::{AgentProfile, Domain, StepStatus, StepTrace, DEFAULT_MODEL};
use crate::Result;
use std::time::Instant;
use tracing::{debug, warn};

pub struct RetrieverAgent {
    profile: AgentProfile,
    domain: Domain,
    queries: &'static [&'static str],
}

impl RetrieverAgent {
    pub fn spending() -> Self {
        Self {
            profile: AgentProfile {
                name: "spending_retriever",
                model: DEFAULT_MODEL,
                description: "An agent that retrieves user transaction data and profile information for the requested period.",
                instruction: "Gather comprehensive spending and profile data: the user's transaction history, then their profile including financial goals. Combine both for the next agent to use.",
            },
            domain: Domain::Spending,
            queries: &["List my recent transactions.", "Get my user profile"],
        }
    }

    pub fn goals() -> Self {
        Self {
            profile: AgentProfile {
                name: "goals_retriever",
                model: DEFAULT_MODEL,
                description: "An agent that retrieves the user's savings goals and profile information.",
                instruction: "Gather the user's savings goals and their profile. Combine both for the next agent to use.",
            },
            domain: Domain::Goals,
            queries: &["List my savings goals.", "Get my user profile"],
        }
    }

    pub fn portfolio() -> Self {
        Self {
            profile: AgentProfile {
                name: "portfolio_retriever",
                model: DEFAULT_MODEL,
                description: "An agent that retrieves user portfolio data and profile information",
                instruction: "Gather comprehensive portfolio data: the user's debts, investments and financial overview, then their profile including financial goals. Combine both for the next agent to use.",
            },
            domain: Domain::Portfolio,
            queries: &[
                "List my portfolio data including debts, investments, and financial overview.",
                "Get my user profile",
            ],
        }
    }

    pub fn perks() -> Self {
        Self {
            profile: AgentProfile {
                name: "perks_retriever",
                model: DEFAULT_MODEL,
                description: "An agent that retrieves the bank's partners and user benefits for the requested period",
                instruction: "Gather comprehensive user benefits data: the user's benefits, the bank's partners, then the user profile including financial goals. Combine everything for the next agent to use.",
            },
            domain: Domain::Perks,
            queries: &[
                "List my benefits.",
                "List the bank partners.",
                "Get my user profile",
            ],
        }
    }

    pub fn advisors() -> Self {
        Self {
            profile: AgentProfile {
                name: "Advisors_retriever",
                model: DEFAULT_MODEL,
                description: "An agent that retrieves the bank's advisors and user meetings",
                instruction: "Gather the user's scheduled meetings, the bank's advisors, then the user profile. Combine everything for the next agent to use.",
            },
            domain: Domain::Advisors,
            queries: &["List my meetings.", "List the advisors.", "Get my user profile"],
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn queries(&self) -> &'static [&'static str] {
        self.queries
    }

    /// Issue every query in order and combine the labelled results.
    ///
    /// A failed query is recorded and skipped; the remaining queries still
    /// run. If nothing at all is retrieved the whole step fails with
    /// `EmptyRetrieval` so the formatter never sees an empty slot.
    pub async fn run(&self, connector: &dyn BankConnector) -> Result<(String, Vec<StepTrace>)> {
        let mut sections = Vec::with_capacity(self.queries.len());
        let mut traces = Vec::with_capacity(self.queries.len());

        debug!(agent = self.profile.name, "Starting retrieval");

        for query in self.queries {
            let start = Instant::now();

            match connector.invoke(query).await {
                Ok(result) => {
                    traces.push(StepTrace {
                        query: query.to_string(),
                        status: StepStatus::Success,
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    });
                    sections.push(format!("### {}\n{}", query, result));
                }
                Err(e) => {
                    warn!(
                        agent = self.profile.name,
                        query = *query,
                        error = %e,
                        "Bank query failed, continuing with remaining queries"
                    );
                    traces.push(StepTrace {
                        query: query.to_string(),
                        status: StepStatus::Failed,
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    });
                }
            }
        }

        if sections.is_empty() {
            return Err(crate::error::AgentError::EmptyRetrieval(self.profile.name));
        }

        debug!(
            agent = self.profile.name,
            sections = sections.len(),
            "Retrieval complete"
        );

        Ok((sections.join("\n\n"), traces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockBankConnector;

    #[tokio::test]
    async fn test_advisors_query_order_is_fixed() {
        let connector = MockBankConnector::new();
        let retriever = RetrieverAgent::advisors();

        retriever.run(&connector).await.unwrap();

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
    async fn test_combined_output_labels_each_query() {
        let connector = MockBankConnector::new()
            .with_response("transactions", "2025-01-03 - Groceries - $54.10")
            .with_response("profile", "Name: Ada. Goal: save $12,000.");
        let retriever = RetrieverAgent::spending();

        let (combined, traces) = retriever.run(&connector).await.unwrap();

        assert!(combined.contains("### List my recent transactions."));
        assert!(combined.contains("Groceries"));
        assert!(combined.contains("save $12,000"));
        assert_eq!(traces.len(), 2);
        assert!(traces.iter().all(|t| t.status == StepStatus::Success));
    }

    #[tokio::test]
    async fn test_failed_query_is_soft() {
        let connector = MockBankConnector::new()
            .failing_on("partners")
            .with_response("benefits", "Travel insurance - Gold tier");
        let retriever = RetrieverAgent::perks();

        let (combined, traces) = retriever.run(&connector).await.unwrap();

        assert!(combined.contains("Travel insurance"));
        assert!(!combined.contains("### List the bank partners."));
        assert_eq!(traces[1].status, StepStatus::Failed);
        // All three queries are still issued in order.
        assert_eq!(connector.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_total_failure_is_empty_retrieval() {
        let connector = MockBankConnector::new()
            .failing_on("transactions")
            .failing_on("profile");
        let retriever = RetrieverAgent::spending();

        let result = retriever.run(&connector).await;
        assert!(matches!(
            result,
            Err(crate::error::AgentError::EmptyRetrieval(_))
        ));
    }
}
