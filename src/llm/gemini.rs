//! Gemini `generateContent` client with function calling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    Content, GenerateRequest, LlmClient, LlmError, ModelResponse, Part, Role, ToolCallRequest,
    ToolDeclaration, ToolResult,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
    /// Marks internal reasoning parts; never surfaced as answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<ToolDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

/// Client for the hosted Gemini API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn to_wire_part(part: &Part) -> GeminiPart {
        match part {
            Part::Text(text) => GeminiPart {
                text: Some(text.clone()),
                ..Default::default()
            },
            Part::FunctionCall(call) => GeminiPart {
                function_call: Some(GeminiFunctionCall {
                    name: call.name.clone(),
                    args: if call.args.is_null() {
                        json!({})
                    } else {
                        call.args.clone()
                    },
                }),
                thought_signature: call.thought_signature.clone(),
                ..Default::default()
            },
            Part::FunctionResponse(result) => GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    name: result.name.clone(),
                    response: json!({ "result": result.payload }),
                }),
                ..Default::default()
            },
        }
    }

    fn to_wire_content(content: &Content) -> GeminiContent {
        GeminiContent {
            role: Some(content.role.as_str().to_string()),
            parts: content.parts.iter().map(Self::to_wire_part).collect(),
        }
    }

    fn build_request(request: &GenerateRequest) -> GeminiRequest {
        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTools {
                function_declarations: request.tools.clone(),
            }]
        };

        GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(request.system_instruction.clone()),
                    ..Default::default()
                }],
            },
            contents: request.contents.iter().map(Self::to_wire_content).collect(),
            tools,
        }
    }

    fn from_wire_part(part: GeminiPart) -> Option<Part> {
        if let Some(call) = part.function_call {
            let mut request = ToolCallRequest::new(call.name, call.args);
            request.thought_signature = part.thought_signature;
            return Some(Part::FunctionCall(request));
        }
        if part.thought == Some(true) {
            return None;
        }
        if let Some(text) = part.text {
            return Some(Part::Text(text));
        }
        part.function_response.map(|response| {
            Part::FunctionResponse(ToolResult {
                name: response.name,
                payload: response.response.to_string(),
            })
        })
    }

    /// Map the first candidate to a wire-neutral response.
    fn parse_response(response: GeminiResponse) -> ModelResponse {
        let block_reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);

        let Some(candidate) = response.candidates.into_iter().next() else {
            return ModelResponse {
                content: None,
                finish_reason: block_reason,
            };
        };

        let content = candidate.content.map(|content| Content {
            role: Role::Model,
            parts: content
                .parts
                .into_iter()
                .filter_map(Self::from_wire_part)
                .collect(),
        });

        ModelResponse {
            content,
            finish_reason: candidate.finish_reason.or(block_reason),
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<ModelResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = Self::build_request(request);

        tracing::debug!(
            "Sending {} turns to {} ({} tools)",
            request.contents.len(),
            model,
            request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        Ok(Self::parse_response(parsed))
    }
}
