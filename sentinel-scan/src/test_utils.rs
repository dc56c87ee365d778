//! Shared fakes for unit tests

use crate::database::{HistoryStore, MemoryStore};
use crate::engine::{ScanClient, ScanOrchestrator};
use crate::oracle::{Oracle, OracleError, OracleReply, OracleRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const MEDIUM_RISK: &str =
    r#"{"riskScore":40,"riskLevel":"MEDIUM","analysis":"Newly registered domain.","findings":["young domain"],"recommendations":["verify sender"]}"#;

/// Answers every request the same way, optionally waiting for
/// [`ScriptedOracle::release`] first
pub struct ScriptedOracle {
    reply: Result<String, String>,
    gate: Option<Notify>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn gated(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            gate: Some(Notify::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, _request: &OracleRequest) -> Result<OracleReply, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            Ok(text) => Ok(OracleReply {
                text: text.clone(),
                citations: Vec::new(),
            }),
            Err(message) => Err(OracleError::ApiError {
                status: 503,
                message: message.clone(),
            }),
        }
    }
}

/// Orchestrator over an in-memory history backend
pub fn memory_orchestrator(oracle: Arc<ScriptedOracle>) -> (ScanOrchestrator, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let history = HistoryStore::load(backend.clone());
    (ScanOrchestrator::new(ScanClient::new(oracle), history), backend)
}
