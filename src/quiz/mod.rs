use crate::llm::{GatewayError, QuizGateway};
use crate::store::{Command, CommandStore, NewCommand, StoreError};
use std::sync::Arc;

/// Stateless façade over the gateway and the store. Every call delegates
/// once and keeps nothing between requests.
#[derive(Clone)]
pub struct QuizService {
    gateway: Arc<dyn QuizGateway>,
    store: Arc<dyn CommandStore>,
}

impl QuizService {
    pub fn new(gateway: Arc<dyn QuizGateway>, store: Arc<dyn CommandStore>) -> Self {
        QuizService { gateway, store }
    }

    pub async fn generate_question(&self, tool_name: &str) -> Result<String, GatewayError> {
        self.gateway.generate_question(tool_name).await
    }

    pub async fn evaluate_answer(
        &self,
        tool_name: &str,
        question: &str,
        user_answer: &str,
    ) -> Result<String, GatewayError> {
        self.gateway
            .evaluate_answer(tool_name, question, user_answer)
            .await
    }

    pub async fn get_command_explanation(
        &self,
        tool_name: &str,
        command: &str,
    ) -> Result<String, GatewayError> {
        self.gateway.explain_command(tool_name, command).await
    }

    pub async fn save_command(
        &self,
        tool_name: &str,
        command_text: &str,
        explanation: &str,
    ) -> Result<Command, StoreError> {
        self.store
            .save(NewCommand::new(tool_name, command_text, explanation))
            .await
    }
}
