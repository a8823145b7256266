//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::Config;
use crate::llm::{Content, FunctionCall, GeminiClient, LlmClient, TokenUsage};
use crate::sandbox::SandboxRoot;
use crate::tools::ToolRegistry;

use super::prompt::build_system_prompt;

/// How a task run ended.
#[derive(Debug, PartialEq)]
pub enum TaskOutcome {
    /// The model answered in plain text.
    Completed { answer: String, iterations: usize },
    /// The iteration budget ran out before a final answer arrived.
    BudgetExhausted { iterations: usize },
}

/// The autonomous agent.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl Agent {
    /// Create a new agent backed by the Gemini API.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = Arc::new(GeminiClient::new(
            config.api_key.clone(),
            config.model.clone(),
        ));
        Self::with_client(config, llm)
    }

    /// Create an agent with a caller-supplied model client.
    pub fn with_client(config: Config, llm: Arc<dyn LlmClient>) -> anyhow::Result<Self> {
        let root = SandboxRoot::new(&config.sandbox_root)?;
        let tools = ToolRegistry::new(root);
        Ok(Self { config, llm, tools })
    }

    /// Run a task until the model answers in plain text or the iteration
    /// budget runs out. Returns the outcome and the accumulated token usage.
    pub async fn run_task(&self, task: &str) -> anyhow::Result<(TaskOutcome, TokenUsage)> {
        let system_prompt = build_system_prompt(&self.tools);
        let declarations = self.tools.declarations();

        let mut history = vec![Content::user_text(task)];
        let mut usage = TokenUsage::default();

        for iteration in 1..=self.config.max_iterations {
            tracing::debug!(
                "Agent iteration {}/{}",
                iteration,
                self.config.max_iterations
            );

            let turn = match self
                .llm
                .generate(&system_prompt, &history, &declarations)
                .await
            {
                Ok(turn) => turn,
                Err(e) => {
                    tracing::warn!("Model call failed on iteration {}: {:#}", iteration, e);
                    continue;
                }
            };

            if let Some(turn_usage) = turn.usage {
                tracing::debug!("Prompt tokens: {}", turn_usage.prompt_tokens);
                tracing::debug!("Response tokens: {}", turn_usage.response_tokens);
                usage.accumulate(turn_usage);
            }

            let calls: Vec<FunctionCall> = turn.content.function_calls().cloned().collect();
            let answer = turn.content.text();
            // The model turn is recorded even when it is malformed; the
            // transcript always matches what the model actually said.
            history.push(turn.content);

            if calls.is_empty() {
                if let Some(answer) = answer {
                    return Ok((
                        TaskOutcome::Completed {
                            answer,
                            iterations: iteration,
                        },
                        usage,
                    ));
                }
                tracing::warn!(
                    "Model returned neither text nor function calls on iteration {}",
                    iteration
                );
                continue;
            }

            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                responses.push(self.tools.dispatch(call).await);
            }
            // All results for one model turn travel back as a single turn.
            history.push(Content::tool_responses(responses));
        }

        Ok((
            TaskOutcome::BudgetExhausted {
                iterations: self.config.max_iterations,
            },
            usage,
        ))
    }
}
