//! LLM client abstraction and the Gemini conversation wire model.
//!
//! The loop talks to the model through the [`LlmClient`] trait so tests can
//! substitute a scripted client. The types here mirror the `generateContent`
//! wire shapes: a conversation is a sequence of [`Content`] turns, each a
//! list of [`Part`]s that are either plain text, a function call issued by
//! the model, or a function response fed back by the dispatcher.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Tool,
}

/// One element of a turn, externally tagged the way Gemini serializes parts:
/// `{"text": ...}`, `{"functionCall": {...}}` or `{"functionResponse": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

/// The outcome of a tool invocation, fed back to the model.
///
/// `response` carries `{"result": <string>}` on success or
/// `{"error": <string>}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One turn of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// A tool turn holding one response part per dispatched call.
    pub fn tool_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::Tool,
            parts: responses.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Concatenated text parts, or `None` when the turn has no text at all.
    pub fn text(&self) -> Option<String> {
        let chunks: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if chunks.is_empty() {
            None
        } else {
            Some(chunks.join("\n"))
        }
    }

    /// The function calls carried by this turn, in wire order.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|part| match part {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }
}

/// A tool descriptor advertised to the model.
///
/// `parameters` is a JSON schema object: `{"type": "object", "properties":
/// {...}}` with optional parameters simply omitted from `required`.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Token counts reported by the provider for one round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
}

impl TokenUsage {
    pub fn accumulate(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.response_tokens += other.response_tokens;
    }
}

/// One model response: the turn to append to history plus usage, if reported.
#[derive(Debug, Clone)]
pub struct ModelTurn {
    pub content: Content,
    pub usage: Option<TokenUsage>,
}

/// Abstraction over the model provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the system instruction, the full history and the tool catalog;
    /// receive the model's next turn.
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[Content],
        tools: &[FunctionDeclaration],
    ) -> anyhow::Result<ModelTurn>;
}
