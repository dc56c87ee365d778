//! Scan Client
//!
//! Builds oracle requests for link and file targets and turns the replies
//! into validated [`ScanResult`]s. Oracle output never leaves this module
//! unchecked.

use crate::engine::result::{GroundingLink, RiskLevel, ScanResult, ScanType};
use crate::engine::ScanError;
use crate::oracle::schema::risk_assessment_schema;
use crate::oracle::{Citation, InlineData, Oracle, OracleRequest};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Assessment fields exactly as the schema demands them
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    risk_score: i64,
    risk_level: String,
    analysis: String,
    findings: Vec<String>,
    recommendations: Vec<String>,
}

/// Assessment after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub analysis: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Parse and validate the oracle's JSON text
pub fn parse_assessment(text: &str) -> Result<Assessment, ScanError> {
    let raw: RawAssessment = serde_json::from_str(strip_code_fence(text))?;

    let risk_score = u8::try_from(raw.risk_score)
        .ok()
        .filter(|score| *score <= 100)
        .ok_or_else(|| {
            ScanError::ContractViolation(format!("riskScore {} is outside 0..=100", raw.risk_score))
        })?;

    let risk_level = raw
        .risk_level
        .parse::<RiskLevel>()
        .map_err(|e| ScanError::ContractViolation(e.to_string()))?;

    Ok(Assessment {
        risk_score,
        risk_level,
        analysis: raw.analysis,
        findings: raw.findings,
        recommendations: raw.recommendations,
    })
}

/// Models occasionally wrap JSON in a markdown fence even in JSON mode
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Keep only citations that carry a web reference
fn grounding_links(citations: Vec<Citation>) -> Vec<GroundingLink> {
    citations
        .into_iter()
        .filter_map(|c| c.web)
        .map(|web| GroundingLink {
            uri: web.uri,
            title: web.title,
        })
        .collect()
}

fn link_prompt(url: &str) -> String {
    format!(
        "Perform a thorough security analysis of this URL: {url}\n\
         Look for phishing patterns, domain reputation problems, malicious redirection \
         and attempts to harvest personal data. Use Google Search to verify the domain's \
         reputation and any public reports of malicious activity."
    )
}

fn file_prompt(file_name: &str, mime_type: &str) -> String {
    format!(
        "Analyze the attached file for security risks.\n\
         File name: {file_name}\n\
         MIME type: {mime_type}\n\n\
         Inspect the content for malicious code and suspicious patterns such as base64-encoded \
         payloads inside scripts, unusual API calls or data exfiltration logic. If the content \
         is binary or too large to read fully, base the analysis on the risks typical for this \
         file type and on the visible header and structure."
    )
}

/// Client that submits scan targets to the oracle
#[derive(Clone)]
pub struct ScanClient {
    oracle: Arc<dyn Oracle>,
}

impl ScanClient {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Analyze a URL with web grounding enabled
    pub async fn analyze_url(&self, url: &str) -> Result<ScanResult, ScanError> {
        info!("Analyzing URL: {}", url);

        let request = OracleRequest {
            prompt: link_prompt(url),
            attachment: None,
            grounding: true,
            response_schema: risk_assessment_schema(),
        };

        let reply = self.oracle.generate(&request).await?;
        let assessment = parse_assessment(&reply.text)?;
        let sources = grounding_links(reply.citations);
        debug!("URL analysis grounded by {} sources", sources.len());

        Ok(assemble(ScanType::Link, url, assessment, Some(sources)))
    }

    /// Analyze a file sent inline as base64
    pub async fn analyze_file(
        &self,
        file_name: &str,
        base64_content: &str,
        mime_type: &str,
    ) -> Result<ScanResult, ScanError> {
        info!("Analyzing file: {} ({})", file_name, mime_type);

        let request = OracleRequest {
            prompt: file_prompt(file_name, mime_type),
            attachment: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: base64_content.to_string(),
            }),
            grounding: false,
            response_schema: risk_assessment_schema(),
        };

        let reply = self.oracle.generate(&request).await?;
        let assessment = parse_assessment(&reply.text)?;

        Ok(assemble(ScanType::File, file_name, assessment, None))
    }
}

fn assemble(
    scan_type: ScanType,
    target: &str,
    assessment: Assessment,
    sources: Option<Vec<GroundingLink>>,
) -> ScanResult {
    ScanResult {
        id: Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        scan_type,
        target: target.to_string(),
        risk_score: assessment.risk_score,
        risk_level: assessment.risk_level,
        analysis: assessment.analysis,
        findings: assessment.findings,
        recommendations: assessment.recommendations,
        sources,
    }
}
