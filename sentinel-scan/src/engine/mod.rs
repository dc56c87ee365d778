//! Core scan engine module

pub mod orchestrator;
pub mod payload;
pub mod result;
pub mod scan_client;

pub use orchestrator::{ScanOrchestrator, ScanState};
pub use payload::{encode_bytes, encode_file, PayloadError};
pub use result::{GroundingLink, RiskLevel, ScanHistoryItem, ScanResult, ScanTarget, ScanType};
pub use scan_client::ScanClient;

use crate::oracle::OracleError;
use thiserror::Error;

/// Shown when a failure renders to an empty message
pub const GENERIC_SCAN_ERROR: &str =
    "An unexpected error occurred during the scan. Please try again.";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid scan parameters: {0}")]
    InvalidInput(String),
    #[error("A scan is already in progress")]
    Busy,
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("Oracle response is not a valid analysis: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("Oracle response violates the analysis contract: {0}")]
    ContractViolation(String),
}

impl ScanError {
    /// Message suitable for the error banner
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_SCAN_ERROR.to_string()
        } else {
            message
        }
    }
}
