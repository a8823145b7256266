//! Gemini `generateContent` client.

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Content, FunctionDeclaration, LlmClient, ModelTurn, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for the Gemini REST API.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclarations<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations<'a> {
    function_declarations: &'a [FunctionDeclaration],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[Content],
        tools: &[FunctionDeclaration],
    ) -> anyhow::Result<ModelTurn> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: system_instruction,
                }],
            },
            contents: history,
            tools: if tools.is_empty() {
                Vec::new()
            } else {
                vec![ToolDeclarations {
                    function_declarations: tools,
                }]
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            let message =
                parse_error_message(&body).unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            anyhow::bail!("Gemini API error: {}", message);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let usage = parsed.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            response_tokens: u.candidates_token_count,
        });

        let content = parsed
            .candidates
            .into_iter()
            .find_map(|candidate| candidate.content)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidates"))?;

        Ok(ModelTurn { content, usage })
    }
}

/// Pull the human-readable message out of a Gemini error body,
/// `{"error": {"message": ...}}`.
fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}
