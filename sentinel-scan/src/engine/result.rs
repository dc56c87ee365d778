//! Scan data model
//!
//! Targets submitted for analysis, the normalized report produced for each
//! completed scan, and the reduced summary kept in the scan history.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of target produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanType {
    /// An uploaded file
    File,
    /// A URL
    Link,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::File => write!(f, "FILE"),
            ScanType::Link => write!(f, "LINK"),
        }
    }
}

/// Risk classification assigned by the oracle
///
/// Ordered by severity. The level is taken as reported and is not derived
/// from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a risk level label is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRiskLevel(pub String);

impl fmt::Display for UnknownRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown risk level '{}'", self.0)
    }
}

impl std::error::Error for UnknownRiskLevel {}

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            _ => Err(UnknownRiskLevel(s.to_string())),
        }
    }
}

/// What a single scan is asked to analyse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// A URL to check for phishing, redirection and reputation issues
    Link { url: String },
    /// A file, already encoded for transmission
    File {
        name: String,
        mime_type: String,
        base64_content: String,
    },
}

impl ScanTarget {
    pub fn link(url: impl Into<String>) -> Self {
        ScanTarget::Link { url: url.into() }
    }

    pub fn scan_type(&self) -> ScanType {
        match self {
            ScanTarget::Link { .. } => ScanType::Link,
            ScanTarget::File { .. } => ScanType::File,
        }
    }

    /// Human-readable name of the target (URL or file name)
    pub fn label(&self) -> &str {
        match self {
            ScanTarget::Link { url } => url,
            ScanTarget::File { name, .. } => name,
        }
    }
}

/// A web reference the oracle used to ground a link analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub uri: String,
    pub title: Option<String>,
}

/// Normalized report for one completed scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub target: String,
    /// 0..=100
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub analysis: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingLink>>,
}

impl ScanResult {
    /// Reduced projection kept in the scan history
    pub fn summary(&self) -> ScanHistoryItem {
        ScanHistoryItem {
            id: self.id.clone(),
            target: self.target.clone(),
            timestamp: self.timestamp,
            risk_level: self.risk_level,
        }
    }

    pub fn sources(&self) -> &[GroundingLink] {
        self.sources.as_deref().unwrap_or(&[])
    }
}

/// Persisted summary of a past scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryItem {
    pub id: String,
    pub target: String,
    pub timestamp: i64,
    pub risk_level: RiskLevel,
}
