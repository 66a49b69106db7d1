//! Track byte stream for the Vibefy server.

use crate::error::{Result, ServerClientError};
use crate::types::TrackBytes;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Client;
use tracing::{debug, trace};
use vibefy_playback::TrackId;

/// Stream client for the Vibefy server.
pub struct StreamClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    cookie: &'a str,
}

impl<'a> StreamClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, cookie: &'a str) -> Self {
        Self {
            http,
            base_url,
            cookie,
        }
    }

    /// Fetch the audio bytes of a track.
    pub async fn fetch_track(&self, track_id: &TrackId) -> Result<TrackBytes> {
        let url = format!("{}/api/playSong/{}", self.base_url, track_id);
        debug!(url = %url, track_id = %track_id, "Fetching track");

        let response = self
            .http
            .get(&url)
            .header(COOKIE, self.cookie)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(ServerClientError::AuthRequired);
            } else if status.as_u16() == 404 {
                return Err(ServerClientError::ServerError {
                    status: 404,
                    message: format!("Track not found: {}", track_id),
                });
            } else {
                let error_text = response.text().await.unwrap_or_default();
                return Err(ServerClientError::ServerError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Get content length if available
        let total_size = response.content_length();
        let capacity = total_size.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
        let mut data = BytesMut::with_capacity(capacity);

        // Stream the response body
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            data.extend_from_slice(&chunk);
            trace!(track_id = %track_id, received = data.len(), total = ?total_size, "Chunk");
        }

        debug!(
            track_id = %track_id,
            size = data.len(),
            content_type = ?content_type,
            "Track fetched"
        );

        Ok(TrackBytes {
            track_id: track_id.clone(),
            content_type,
            data: data.freeze(),
        })
    }
}
