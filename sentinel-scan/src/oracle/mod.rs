//! Oracle Module
//!
//! The remote generative-AI service that performs the actual risk judgment.
//! The rest of the crate talks to it only through the [`Oracle`] trait:
//! - [`GeminiOracle`] calls the Gemini `generateContent` REST endpoint
//! - tests substitute in-process fakes

pub mod gemini;
pub mod schema;

pub use gemini::GeminiOracle;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("No API key configured. Set GEMINI_API_KEY or pass --api-key")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Oracle returned {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("Request was blocked by the oracle: {0}")]
    Blocked(String),
    #[error("Oracle returned no analysis")]
    EmptyResponse,
}

/// Binary attachment sent inline with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    /// Standard base64
    pub data: String,
}

/// One request to the oracle
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub prompt: String,
    pub attachment: Option<InlineData>,
    /// Ask the oracle to corroborate its answer with live web search
    pub grounding: bool,
    /// Structured output schema the reply must follow
    pub response_schema: serde_json::Value,
}

/// Web reference attached to a citation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebReference {
    pub uri: String,
    pub title: Option<String>,
}

/// Grounding citation returned with a reply
///
/// Only web citations are of interest; other kinds carry no reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Citation {
    pub web: Option<WebReference>,
}

/// Raw reply: the model text (expected to be JSON) plus any citations
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OracleReply {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Generative-AI backend performing the risk judgment
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Issue a single request. No retries.
    async fn generate(&self, request: &OracleRequest) -> Result<OracleReply, OracleError>;
}
