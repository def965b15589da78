//! Chat orchestrator and domain specialists
//!
//! A chat turn arrives with an externally supplied topic value. The
//! orchestrator exact-matches the topic to one of five specialists and
//! delegates the whole turn to it; the specialist queries the bank agent
//! directly and answers in free text, with no separate formatting stage.

use crate::connector::BankConnector;
use crate::llm::Llm;
use crate::models::{AgentProfile, ChatAnswer, Topic, DEFAULT_MODEL};
use crate::state::SessionState;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Specialist {
    topic: Topic,
    profile: AgentProfile,
}

impl Specialist {
    pub fn spending() -> Self {
        Self {
            topic: Topic::Spending,
            profile: AgentProfile {
                name: "spending_specialist",
                model: DEFAULT_MODEL,
                description: "Specialist agent for spending analysis, transactions, budgeting, and expense management",
                instruction: "You are a spending and transaction specialist at Cymbal Bank, a proxy between the user and the Cymbal bank services. Answer the user's questions about their spending, transactions, budgets and expenses using the bank records provided. Deliver comprehensive spending insights and recommendations, and ask the user for clarification if you need more details such as time periods or categories.",
            },
        }
    }

    pub fn goals() -> Self {
        Self {
            topic: Topic::Goals,
            profile: AgentProfile {
                name: "goals_specialist",
                model: DEFAULT_MODEL,
                description: "Specialist agent for financial goals, savings targets, and future planning",
                instruction: "You are a financial goals specialist at Cymbal Bank, a proxy between the user and the Cymbal bank services. Answer the user's questions about their financial goals, savings targets and future planning using the bank records provided. Deliver goal-setting advice and progress tracking, and ask the user for clarification if you need more details such as goal amounts, timelines or priorities.",
            },
        }
    }

    pub fn portfolio() -> Self {
        Self {
            topic: Topic::Portfolio,
            profile: AgentProfile {
                name: "portfolio_specialist",
                model: DEFAULT_MODEL,
                description: "Specialist agent for investment portfolios, performance analysis, and market insights",
                instruction: "You are an investment portfolio specialist at Cymbal Bank, a proxy between the user and the Cymbal bank services. Answer the user's questions about their investment portfolios, performance and market insights using the bank records provided. Deliver comprehensive investment analysis and portfolio recommendations, and ask the user for clarification if you need more details such as time periods or risk preferences.",
            },
        }
    }

    pub fn perks() -> Self {
        Self {
            topic: Topic::Perks,
            profile: AgentProfile {
                name: "perks_specialist",
                model: DEFAULT_MODEL,
                description: "Specialist agent for banking perks, benefits, rewards, and account features",
                instruction: "You are a banking perks and benefits specialist at Cymbal Bank, a proxy between the user and the Cymbal bank services. Answer the user's questions about perks, benefits, rewards and account features using the bank records provided. Deliver perks optimization and benefits maximization advice, and ask the user for clarification if you need more details such as account type or spending categories.",
            },
        }
    }

    pub fn advisors() -> Self {
        Self {
            topic: Topic::Advisors,
            profile: AgentProfile {
                name: "advisors_specialist",
                model: DEFAULT_MODEL,
                description: "Specialist agent for financial advisory services, expert consultations, and professional guidance",
                instruction: "You are a financial advisory services specialist at Cymbal Bank, a proxy between the user and the Cymbal bank services. Answer the user's questions about advisory services, expert consultations and professional guidance using the bank records provided. Deliver advisory service recommendations and next steps, and ask the user for clarification if you need more details such as financial goals or service preferences.",
            },
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Answer one user turn: query the bank agent with the user's message,
    /// then compose a free-text answer from whatever came back.
    pub async fn answer(
        &self,
        connector: &dyn BankConnector,
        llm: &dyn Llm,
        query: &str,
    ) -> Result<ChatAnswer> {
        let bank_context = match connector.invoke(query).await {
            Ok(records) => records,
            Err(e) => {
                // Degrade rather than fail the turn when the remote read
                // is unavailable.
                warn!(
                    specialist = self.profile.name,
                    error = %e,
                    "Bank query failed, answering without live data"
                );
                "Live account data is currently unavailable.".to_string()
            }
        };

        let prompt = format!(
            "Bank records:\n{}\n\nUser question: {}",
            bank_context, query
        );

        let (answer, confidence) = llm
            .generate(self.profile.model, self.profile.instruction, &prompt)
            .await?;

        Ok(ChatAnswer {
            answer,
            topic: self.topic,
            specialist: self.profile.name,
            confidence,
        })
    }
}

/// Routes each chat turn to exactly one domain specialist based on the
/// externally supplied topic value.
pub struct ChatOrchestrator {
    profile: AgentProfile,
    connector: Arc<dyn BankConnector>,
    llm: Arc<dyn Llm>,
    specialists: Vec<Specialist>,
}

impl ChatOrchestrator {
    pub fn new(connector: Arc<dyn BankConnector>, llm: Arc<dyn Llm>) -> Self {
        Self {
            profile: AgentProfile {
                name: "chat_orchestrator",
                model: DEFAULT_MODEL,
                description: "Intelligent banking assistant that routes queries to specialized domain experts",
                instruction: "Route the user's query to the appropriate specialist agent based on the current topic.",
            },
            connector,
            llm,
            specialists: vec![
                Specialist::spending(),
                Specialist::goals(),
                Specialist::portfolio(),
                Specialist::perks(),
                Specialist::advisors(),
            ],
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Delegate one turn. An unrecognized topic is an error, not a default
    /// delegation.
    pub async fn handle(
        &self,
        topic: &str,
        query: &str,
        state: &mut SessionState,
    ) -> Result<ChatAnswer> {
        let topic: Topic = topic.parse()?;
        state.topic = Some(topic);

        let specialist = self
            .specialists
            .iter()
            .find(|s| s.topic() == topic)
            .ok_or_else(|| crate::error::AgentError::UnknownTopic(topic.to_string()))?;

        info!(
            orchestrator = self.profile.name,
            topic = %topic,
            specialist = specialist.profile().name,
            "Delegating chat turn"
        );

        let answer = specialist
            .answer(self.connector.as_ref(), self.llm.as_ref(), query)
            .await?;

        state.final_response = Some(answer.answer.clone());

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockBankConnector;
    use crate::llm::MockLlm;

    #[tokio::test]
    async fn test_goals_topic_delegates_to_goals_specialist() {
        let connector = Arc::new(
            MockBankConnector::new().with_response("saving", "Goal: $12,000 by December"),
        );
        let llm = Arc::new(MockLlm::new().with_answer("You are 40% of the way there."));
        let orchestrator = ChatOrchestrator::new(connector.clone(), llm);
        let mut state = SessionState::new();

        let answer = orchestrator
            .handle("goals", "How is my saving goal going?", &mut state)
            .await
            .unwrap();

        assert_eq!(answer.specialist, "goals_specialist");
        assert_eq!(answer.topic, Topic::Goals);
        assert_eq!(state.topic, Some(Topic::Goals));
        assert_eq!(
            state.final_response.as_deref(),
            Some("You are 40% of the way there.")
        );
        // The specialist queried the bank agent once, with the user's turn.
        assert_eq!(connector.calls(), vec!["How is my saving goal going?".to_string()]);
    }

    #[tokio::test]
    async fn test_unrecognized_topic_is_an_error() {
        let connector = Arc::new(MockBankConnector::new());
        let llm = Arc::new(MockLlm::new());
        let orchestrator = ChatOrchestrator::new(connector.clone(), llm);
        let mut state = SessionState::new();

        let result = orchestrator.handle("taxes", "Lower my taxes", &mut state).await;

        assert!(matches!(
            result,
            Err(crate::error::AgentError::UnknownTopic(ref t)) if t == "taxes"
        ));
        // Nothing was delegated and no state was written.
        assert!(connector.calls().is_empty());
        assert!(state.topic.is_none());
        assert!(state.final_response.is_none());
    }

    #[tokio::test]
    async fn test_specialist_degrades_when_bank_is_down() {
        let connector = Arc::new(MockBankConnector::new().failing_on("spent"));
        let llm = Arc::new(MockLlm::new());
        let orchestrator = ChatOrchestrator::new(connector, llm.clone());
        let mut state = SessionState::new();

        let answer = orchestrator
            .handle("spending", "How much have I spent on rent?", &mut state)
            .await
            .unwrap();

        assert_eq!(answer.specialist, "spending_specialist");
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("currently unavailable"));
    }

    #[tokio::test]
    async fn test_each_topic_reaches_its_own_specialist() {
        let connector = Arc::new(MockBankConnector::new());
        let llm = Arc::new(MockLlm::new());
        let orchestrator = ChatOrchestrator::new(connector, llm);

        for (topic, expected) in [
            ("spending", "spending_specialist"),
            ("goals", "goals_specialist"),
            ("portfolio", "portfolio_specialist"),
            ("perks", "perks_specialist"),
            ("advisors", "advisors_specialist"),
        ] {
            let mut state = SessionState::new();
            let answer = orchestrator.handle(topic, "hello", &mut state).await.unwrap();
            assert_eq!(answer.specialist, expected);
        }
    }
}
