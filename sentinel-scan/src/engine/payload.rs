//! File payload encoding
//!
//! Turns a file on disk (or bytes received over HTTP) into a
//! [`ScanTarget::File`] ready to be sent inline to the oracle.

use crate::engine::result::ScanTarget;
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default client-side size ceiling (5 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("{0} is empty")]
    Empty(String),
    #[error("Not a regular file: {0}")]
    NotAFile(String),
    #[error("Invalid base64 content: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
}

/// Read and encode a file, enforcing the size ceiling before reading
pub async fn encode_file(
    path: &Path,
    mime_override: Option<&str>,
    max_bytes: u64,
) -> Result<ScanTarget, PayloadError> {
    let display = path.display().to_string();
    let read_error = |source| PayloadError::ReadError {
        path: display.clone(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
    if !metadata.is_file() {
        return Err(PayloadError::NotAFile(display.clone()));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| display.clone());

    check_size(&name, metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path).await.map_err(read_error)?;
    let mime_type = mime_override
        .map(str::to_string)
        .unwrap_or_else(|| guess_mime_type(&name).to_string());

    encode_bytes(&name, &bytes, &mime_type, max_bytes)
}

/// Encode bytes already in memory
pub fn encode_bytes(
    name: &str,
    bytes: &[u8],
    mime_type: &str,
    max_bytes: u64,
) -> Result<ScanTarget, PayloadError> {
    check_size(name, bytes.len() as u64, max_bytes)?;

    let mime_type = if mime_type.trim().is_empty() {
        FALLBACK_MIME_TYPE
    } else {
        mime_type.trim()
    };
    debug!("Encoding {} ({} bytes, {})", name, bytes.len(), mime_type);

    Ok(ScanTarget::File {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        base64_content: general_purpose::STANDARD.encode(bytes),
    })
}

/// Validate base64 content received from a client and re-check its size
pub fn decode_upload(
    name: &str,
    base64_content: &str,
    mime_type: &str,
    max_bytes: u64,
) -> Result<ScanTarget, PayloadError> {
    let content = base64_content.trim();

    // Decoded size from the encoded length, reject early before decoding
    let padding = content.bytes().rev().take(2).filter(|b| *b == b'=').count() as u64;
    let estimated = (content.len() as u64 / 4 * 3).saturating_sub(padding);
    check_size(name, estimated, max_bytes)?;

    let bytes = general_purpose::STANDARD.decode(content)?;
    encode_bytes(name, &bytes, mime_type, max_bytes)
}

fn check_size(name: &str, size: u64, limit: u64) -> Result<(), PayloadError> {
    if size == 0 {
        return Err(PayloadError::Empty(name.to_string()));
    }
    if size > limit {
        return Err(PayloadError::TooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// MIME type from the file extension
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "js" | "mjs" => "text/javascript",
        "ts" => "text/x-typescript",
        "py" => "text/x-python",
        "sh" | "bash" => "text/x-shellscript",
        "ps1" => "text/x-powershell",
        "bat" | "cmd" => "application/x-bat",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "exe" | "dll" => "application/vnd.microsoft.portable-executable",
        "apk" => "application/vnd.android.package-archive",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => FALLBACK_MIME_TYPE,
    }
}
