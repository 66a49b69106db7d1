//! Track upload operations for the Vibefy server.

use crate::error::{Result, ServerClientError};
use crate::types::UploadReceipt;
use reqwest::header::COOKIE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::path::Path;
use tracing::{debug, info};

/// Upload client for the Vibefy server.
pub struct UploadClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    cookie: &'a str,
}

impl<'a> UploadClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, cookie: &'a str) -> Self {
        Self {
            http,
            base_url,
            cookie,
        }
    }

    /// Send one audio file as the multipart field `file`
    ///
    /// The whole file is read before sending; the server extracts metadata
    /// from the complete upload.
    pub async fn upload_track(&self, file_path: &Path) -> Result<UploadReceipt> {
        if !file_path.is_file() {
            return Err(ServerClientError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string());

        let contents = tokio::fs::read(file_path).await?;
        let size = contents.len() as u64;
        debug!(file = %file_name, size, "Uploading track");

        let form = Form::new().part(
            "file",
            Part::bytes(contents)
                .file_name(file_name.clone())
                .mime_str(mime_type_for_file(file_path))?,
        );

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .header(COOKIE, self.cookie)
            .multipart(form)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            s if s.is_success() => {
                info!(file = %file_name, size, "Track uploaded");
                Ok(UploadReceipt {
                    file_name,
                    size,
                    message: body,
                })
            }
            StatusCode::UNAUTHORIZED => Err(ServerClientError::AuthRequired),
            StatusCode::PAYLOAD_TOO_LARGE => Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: if body.is_empty() {
                    format!("{file_name} is too large")
                } else {
                    body
                },
            }),
            _ => Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

/// Content type sent with an upload, by extension (case-insensitive)
pub fn mime_type_for_file(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("opus") => "audio/opus",
        Some("wav") => "audio/wav",
        Some("m4a" | "aac") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
