//! Scan Orchestrator
//!
//! Runs one user-triggered scan at a time: tracks the in-flight flag, the
//! current result and the last error, and records successful results in the
//! history.

use crate::database::HistoryStore;
use crate::engine::payload::FALLBACK_MIME_TYPE;
use crate::engine::result::{ScanHistoryItem, ScanResult, ScanTarget};
use crate::engine::scan_client::ScanClient;
use crate::engine::ScanError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

/// Snapshot of the orchestrator's view state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub in_flight: bool,
    pub current_result: Option<ScanResult>,
    pub last_error: Option<String>,
}

pub struct ScanOrchestrator {
    client: ScanClient,
    history: Mutex<HistoryStore>,
    state: Mutex<ScanState>,
    busy: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the single-flight slot; releasing it clears `in_flight` on every
/// exit path, including a dropped scan future.
struct InFlight<'a> {
    busy: &'a AtomicBool,
    state: &'a Mutex<ScanState>,
}

impl<'a> InFlight<'a> {
    fn acquire(busy: &'a AtomicBool, state: &'a Mutex<ScanState>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { busy, state })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).in_flight = false;
        self.busy.store(false, Ordering::Release);
    }
}

impl ScanOrchestrator {
    pub fn new(client: ScanClient, history: HistoryStore) -> Self {
        Self {
            client,
            history: Mutex::new(history),
            state: Mutex::new(ScanState::default()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ScanState {
        lock(&self.state).clone()
    }

    /// History entries, most recent first
    pub fn history(&self) -> Vec<ScanHistoryItem> {
        lock(&self.history).items().to_vec()
    }

    pub fn is_scanning(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one scan to completion.
    ///
    /// Rejected with [`ScanError::Busy`] while another scan is in flight; the
    /// state is left untouched in that case. Otherwise the outcome is
    /// reflected in [`ScanState`] and also returned.
    pub async fn submit_scan(&self, target: ScanTarget) -> Result<ScanResult, ScanError> {
        let Some(_flight) = InFlight::acquire(&self.busy, &self.state) else {
            warn!("Rejected scan of {}: another scan is in flight", target.label());
            return Err(ScanError::Busy);
        };

        {
            let mut state = lock(&self.state);
            state.in_flight = true;
            state.last_error = None;
            state.current_result = None;
        }

        info!("Scan started: {} {}", target.scan_type(), target.label());
        let outcome = self.dispatch(&target).await;

        match &outcome {
            Ok(result) => {
                {
                    let mut state = lock(&self.state);
                    state.current_result = Some(result.clone());
                    state.last_error = None;
                }
                if let Err(e) = lock(&self.history).record_result(result) {
                    warn!("Failed to persist scan history: {}", e);
                }
                info!(
                    "Scan completed: {} scored {} ({})",
                    result.target, result.risk_score, result.risk_level
                );
            }
            Err(e) => {
                error!("Scan of {} failed: {}", target.label(), e);
                lock(&self.state).last_error = Some(e.user_message());
            }
        }

        outcome
    }

    async fn dispatch(&self, target: &ScanTarget) -> Result<ScanResult, ScanError> {
        match target {
            ScanTarget::Link { url } => {
                if url.trim().is_empty() {
                    return Err(ScanError::InvalidInput("a URL is required".to_string()));
                }
                self.client.analyze_url(url).await
            }
            ScanTarget::File {
                name,
                mime_type,
                base64_content,
            } => {
                if name.trim().is_empty() || base64_content.is_empty() {
                    return Err(ScanError::InvalidInput(
                        "a file name and content are required".to_string(),
                    ));
                }
                let mime_type = match mime_type.trim() {
                    "" => FALLBACK_MIME_TYPE,
                    m => m,
                };
                self.client.analyze_file(name, base64_content, mime_type).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{KeyValueStore, HISTORY_KEY};
    use crate::engine::result::{RiskLevel, ScanType};
    use crate::test_utils::{memory_orchestrator as orchestrator, ScriptedOracle, MEDIUM_RISK};

    #[tokio::test]
    async fn test_successful_link_scan() {
        let oracle = ScriptedOracle::answering(MEDIUM_RISK);
        let (orch, backend) = orchestrator(oracle.clone());

        let result = orch.submit_scan(ScanTarget::link("http://example.com")).await.unwrap();
        assert_eq!(oracle.calls(), 1);

        let state = orch.state();
        assert!(!state.in_flight);
        assert_eq!(state.last_error, None);
        let current = state.current_result.unwrap();
        assert_eq!(current, result);
        assert_eq!(current.scan_type, ScanType::Link);
        assert_eq!(current.risk_level, RiskLevel::Medium);

        let history = orch.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].target, "http://example.com");
        assert!(backend.get(HISTORY_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_scan_defaults_mime_type() {
        let oracle = ScriptedOracle::answering(MEDIUM_RISK);
        let (orch, _) = orchestrator(oracle);

        let target = ScanTarget::File {
            name: "dropper.js".to_string(),
            mime_type: String::new(),
            base64_content: "YWxlcnQoMSk=".to_string(),
        };
        let result = orch.submit_scan(target).await.unwrap();
        assert_eq!(result.target, "dropper.js");
        assert_eq!(result.scan_type, ScanType::File);
        assert_eq!(result.sources, None);
    }

    #[tokio::test]
    async fn test_failed_scan_sets_error_and_keeps_history() {
        let (orch, backend) = orchestrator(ScriptedOracle::answering(MEDIUM_RISK));
        orch.submit_scan(ScanTarget::link("http://first.example")).await.unwrap();
        let before = backend.get(HISTORY_KEY).unwrap();

        let failing = ScriptedOracle::failing("connection reset");
        let orch = ScanOrchestrator::new(
            ScanClient::new(failing),
            HistoryStore::load(backend.clone()),
        );
        let err = orch.submit_scan(ScanTarget::link("http://example.com")).await.unwrap_err();
        assert!(matches!(err, ScanError::Oracle(_)));

        let state = orch.state();
        assert!(!state.in_flight);
        assert_eq!(state.current_result, None);
        let message = state.last_error.unwrap();
        assert!(message.contains("connection reset"));
        assert_eq!(orch.history().len(), 1);
        assert_eq!(backend.get(HISTORY_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn test_new_scan_clears_previous_outcome() {
        let (orch, _) = orchestrator(ScriptedOracle::answering(MEDIUM_RISK));
        orch.submit_scan(ScanTarget::link("")).await.unwrap_err();
        assert!(orch.state().last_error.is_some());

        orch.submit_scan(ScanTarget::link("http://example.com")).await.unwrap();
        let state = orch.state();
        assert_eq!(state.last_error, None);
        assert!(state.current_result.is_some());
    }

    #[tokio::test]
    async fn test_url_is_recorded_as_submitted() {
        let (orch, _) = orchestrator(ScriptedOracle::answering(MEDIUM_RISK));

        let result = orch.submit_scan(ScanTarget::link(" http://example.com ")).await.unwrap();
        assert_eq!(result.target, " http://example.com ");
        assert_eq!(orch.history()[0].target, " http://example.com ");
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_oracle() {
        let oracle = ScriptedOracle::answering(MEDIUM_RISK);
        let (orch, _) = orchestrator(oracle.clone());

        let err = orch.submit_scan(ScanTarget::link("   ")).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));

        let err = orch
            .submit_scan(ScanTarget::File {
                name: "empty.txt".to_string(),
                mime_type: "text/plain".to_string(),
                base64_content: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));

        assert_eq!(oracle.calls(), 0);
        assert!(orch.state().last_error.unwrap().starts_with("Invalid scan parameters"));
        assert!(orch.history().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected() {
        let oracle = ScriptedOracle::gated(MEDIUM_RISK);
        let (orch, _) = orchestrator(oracle.clone());

        let first = orch.submit_scan(ScanTarget::link("http://first.example"));
        let second = async {
            let state = orch.state();
            assert!(state.in_flight);
            assert!(orch.is_scanning());
            let rejected = orch.submit_scan(ScanTarget::link("http://second.example")).await;
            oracle.release();
            rejected
        };

        let (first, second) = tokio::join!(first, second);
        assert!(matches!(second, Err(ScanError::Busy)));
        assert_eq!(first.unwrap().target, "http://first.example");
        assert_eq!(oracle.calls(), 1);

        let history = orch.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].target, "http://first.example");
        assert!(!orch.state().in_flight);
    }

    #[tokio::test]
    async fn test_dropped_scan_releases_flight() {
        let oracle = ScriptedOracle::gated(MEDIUM_RISK);
        let (orch, _) = orchestrator(oracle);

        tokio::select! {
            biased;
            _ = orch.submit_scan(ScanTarget::link("http://slow.example")) => panic!("scan should still be pending"),
            _ = tokio::task::yield_now() => {}
        }

        assert!(!orch.is_scanning());
        assert!(!orch.state().in_flight);
    }

    #[tokio::test]
    async fn test_eleven_scans_keep_ten_most_recent() {
        let (orch, _) = orchestrator(ScriptedOracle::answering(MEDIUM_RISK));
        for n in 1..=11 {
            orch.submit_scan(ScanTarget::link(format!("http://site{}.example", n)))
                .await
                .unwrap();
        }

        let history = orch.history();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].target, "http://site11.example");
        assert_eq!(history[9].target, "http://site2.example");
    }
}
