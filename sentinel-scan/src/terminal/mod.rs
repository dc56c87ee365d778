//! Terminal UI Module
//!
//! Presentation layer: text rendering for the CLI and a small HTTP server
//! serving the single-page scanner UI plus a JSON API over the orchestrator.

pub mod page;
pub mod render;

use crate::engine::ScanOrchestrator;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Server error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Largest decoded upload accepted by `/api/scan/file`
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub u64);

/// HTTP server for the scanner UI
pub struct TerminalServer {
    port: u16,
    orchestrator: Arc<ScanOrchestrator>,
    max_file_bytes: u64,
}

impl TerminalServer {
    /// Create a new terminal server
    pub fn new(port: u16, orchestrator: Arc<ScanOrchestrator>, max_file_bytes: u64) -> Self {
        Self {
            port,
            orchestrator,
            max_file_bytes,
        }
    }

    /// Run the terminal server until shutdown
    pub async fn run(&self) -> Result<(), TerminalError> {
        info!("Starting terminal server on http://127.0.0.1:{}", self.port);

        let orchestrator = web::Data::from(self.orchestrator.clone());
        let limit = web::Data::new(UploadLimit(self.max_file_bytes));
        // base64 inflates by 4/3; leave headroom for the JSON envelope
        let json_limit = (self.max_file_bytes as usize / 3 + 1) * 4 + 64 * 1024;

        HttpServer::new(move || {
            App::new()
                .app_data(orchestrator.clone())
                .app_data(limit.clone())
                .app_data(web::JsonConfig::default().limit(json_limit))
                .configure(routes)
        })
        .bind(("127.0.0.1", self.port))?
        .run()
        .await?;

        Ok(())
    }
}

/// Register the UI and API routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(page::index))
        .route("/api/state", web::get().to(api::get_state))
        .route("/api/history", web::get().to(api::get_history))
        .route("/api/scan/url", web::post().to(api::scan_url))
        .route("/api/scan/file", web::post().to(api::scan_file));
}

/// API handlers module
mod api {
    use super::UploadLimit;
    use crate::engine::payload::{decode_upload, PayloadError};
    use crate::engine::{ScanError, ScanOrchestrator, ScanTarget};
    use actix_web::{web, HttpResponse};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    pub struct UrlScanRequest {
        pub url: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FileScanRequest {
        pub name: String,
        #[serde(default)]
        pub mime_type: String,
        /// Standard base64
        pub content: String,
    }

    fn scan_error(err: &ScanError) -> HttpResponse {
        let body = json!({ "error": err.user_message() });
        match err {
            ScanError::Busy => HttpResponse::Conflict().json(body),
            ScanError::InvalidInput(_) => HttpResponse::BadRequest().json(body),
            _ => HttpResponse::BadGateway().json(body),
        }
    }

    fn payload_error(err: &PayloadError) -> HttpResponse {
        let body = json!({ "error": err.to_string() });
        match err {
            PayloadError::TooLarge { .. } => HttpResponse::PayloadTooLarge().json(body),
            _ => HttpResponse::BadRequest().json(body),
        }
    }

    async fn run(orchestrator: &ScanOrchestrator, target: ScanTarget) -> HttpResponse {
        match orchestrator.submit_scan(target).await {
            Ok(result) => HttpResponse::Ok().json(result),
            Err(e) => scan_error(&e),
        }
    }

    /// Current orchestrator state
    pub async fn get_state(orchestrator: web::Data<ScanOrchestrator>) -> HttpResponse {
        HttpResponse::Ok().json(orchestrator.state())
    }

    /// Recent scans, most recent first
    pub async fn get_history(orchestrator: web::Data<ScanOrchestrator>) -> HttpResponse {
        HttpResponse::Ok().json(orchestrator.history())
    }

    pub async fn scan_url(
        orchestrator: web::Data<ScanOrchestrator>,
        req: web::Json<UrlScanRequest>,
    ) -> HttpResponse {
        let req = req.into_inner();
        run(&orchestrator, ScanTarget::Link { url: req.url }).await
    }

    pub async fn scan_file(
        orchestrator: web::Data<ScanOrchestrator>,
        limit: web::Data<UploadLimit>,
        req: web::Json<FileScanRequest>,
    ) -> HttpResponse {
        let target = match decode_upload(&req.name, &req.content, &req.mime_type, limit.0) {
            Ok(target) => target,
            Err(e) => return payload_error(&e),
        };
        run(&orchestrator, target).await
    }
}
