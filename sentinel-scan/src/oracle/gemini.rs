//! Gemini Module
//!
//! Integration with the Gemini `generateContent` REST API

use super::{Citation, InlineData, Oracle, OracleError, OracleReply, OracleRequest, WebReference};
use crate::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
pub struct WebChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-success statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: Option<String>,
    pub status: Option<String>,
}

impl GenerateContentRequest {
    pub fn from_request(request: &OracleRequest) -> Self {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(InlineData { mime_type, data }) = &request.attachment {
            parts.push(Part::InlineData {
                inline_data: Blob {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            });
        }

        let tools = if request.grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            tools,
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: request.response_schema.clone(),
            },
        }
    }
}

impl GenerateContentResponse {
    /// Extract the model text and grounding citations of the first candidate
    pub fn into_reply(self) -> Result<OracleReply, OracleError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return match self.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => Err(OracleError::Blocked(reason)),
                None => Err(OracleError::EmptyResponse),
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            if let Some(reason) = candidate.finish_reason.as_deref() {
                warn!("Oracle finished without text (finish reason: {})", reason);
            }
            return Err(OracleError::EmptyResponse);
        }

        let citations = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .map(|chunk| Citation {
                web: chunk.web.and_then(|web| {
                    web.uri.map(|uri| WebReference {
                        uri,
                        title: web.title,
                    })
                }),
            })
            .collect();

        Ok(OracleReply { text, citations })
    }
}

/// Build an [`OracleError::ApiError`] from a failed response body
pub fn api_error(status: u16, reason: Option<&str>, body: &str) -> OracleError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message.or(b.error.status))
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());
    OracleError::ApiError { status, message }
}

/// Gemini-backed oracle
pub struct GeminiOracle {
    http_client: reqwest::Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiOracle {
    /// Create a new Gemini client
    pub fn new(
        api_key: Option<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        Ok(Self {
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
            api_base: api_base.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, OracleError> {
        Self::new(
            config.api_key.clone(),
            config.api_base_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(OracleError::MissingApiKey)?;

        let body = GenerateContentRequest::from_request(request);
        debug!(
            "Calling {} (grounding: {}, attachment: {})",
            self.model,
            request.grounding,
            request.attachment.is_some()
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), status.canonical_reason(), &text));
        }

        let data: GenerateContentResponse = response.json().await?;
        data.into_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::schema::risk_assessment_schema;

    fn request(grounding: bool, attachment: Option<InlineData>) -> OracleRequest {
        OracleRequest {
            prompt: "check this".to_string(),
            attachment,
            grounding,
            response_schema: risk_assessment_schema(),
        }
    }

    #[test]
    fn test_link_request_enables_search_tool() {
        let body = serde_json::to_value(GenerateContentRequest::from_request(&request(true, None))).unwrap();
        assert_eq!(body["tools"][0]["googleSearch"], serde_json::json!({}));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "check this");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_file_request_carries_inline_data() {
        let attachment = InlineData {
            mime_type: "text/x-shellscript".to_string(),
            data: "ZWNobyBoaQ==".to_string(),
        };
        let body = serde_json::to_value(GenerateContentRequest::from_request(&request(false, Some(attachment)))).unwrap();
        assert!(body.get("tools").is_none());
        let inline = &body["contents"][0]["parts"][1]["inlineData"];
        assert_eq!(inline["mimeType"], "text/x-shellscript");
        assert_eq!(inline["data"], "ZWNobyBoaQ==");
    }

    #[test]
    fn test_reply_extraction_with_grounding() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"riskScore\":"}, {"text": "85}"}]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "http://ref.example", "title": "Ref"}},
                    {"retrievedContext": {"uri": "ignored"}},
                    {"web": {"uri": "http://untitled.example"}}
                ]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.text, "{\"riskScore\":85}");
        assert_eq!(reply.citations.len(), 3);
        assert_eq!(
            reply.citations[0].web,
            Some(WebReference {
                uri: "http://ref.example".to_string(),
                title: Some("Ref".to_string()),
            })
        );
        assert_eq!(reply.citations[1].web, None);
        assert_eq!(reply.citations[2].web.as_ref().unwrap().title, None);
    }

    #[test]
    fn test_thought_parts_are_skipped() {
        let raw = r#"{"candidates": [{"content": {"parts": [
            {"text": "thinking...", "thought": true},
            {"text": "{}"}
        ]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_reply().unwrap().text, "{}");
    }

    #[test]
    fn test_blocked_prompt() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(response.into_reply(), Err(OracleError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn test_candidate_without_text_is_empty_response() {
        let raw = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(response.into_reply(), Err(OracleError::EmptyResponse)));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = api_error(429, Some("Too Many Requests"), body);
        assert_eq!(err.to_string(), "Oracle returned 429: Resource has been exhausted");

        let err = api_error(503, Some("Service Unavailable"), "<html>oops</html>");
        assert_eq!(err.to_string(), "Oracle returned 503: Service Unavailable");
    }

    #[test]
    fn test_endpoint_format() {
        let oracle = GeminiOracle::new(None, "https://api.test/v1beta/", "m-1", Duration::from_secs(5)).unwrap();
        assert_eq!(oracle.endpoint(), "https://api.test/v1beta/models/m-1:generateContent");
        assert_eq!(oracle.model(), "m-1");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_sending() {
        let oracle = GeminiOracle::new(Some("  ".to_string()), DEFAULT_API_BASE, DEFAULT_MODEL, Duration::from_secs(5)).unwrap();
        let result = oracle.generate(&request(true, None)).await;
        assert!(matches!(result, Err(OracleError::MissingApiKey)));
    }
}
