//! Song list operations for the Vibefy server.

use crate::error::{Result, ServerClientError};
use crate::types::{Catalog, CatalogResponse};
use reqwest::header::COOKIE;
use reqwest::Client;
use tracing::debug;

/// Library client for the Vibefy server.
pub struct LibraryClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    cookie: &'a str,
}

impl<'a> LibraryClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, cookie: &'a str) -> Self {
        Self {
            http,
            base_url,
            cookie,
        }
    }

    /// Get the logged-in user's song list.
    pub async fn get_song_list(&self) -> Result<Catalog> {
        let url = format!("{}/api/getUserSongList", self.base_url);
        debug!(url = %url, "Fetching song list");

        let response = self
            .http
            .get(&url)
            .header(COOKIE, self.cookie)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let body: CatalogResponse = response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse song list: {}", e))
            })?;
            let catalog = Catalog::new(body.into_entries());

            debug!(songs = catalog.len(), "Fetched song list");
            Ok(catalog)
        } else if status.as_u16() == 401 {
            Err(ServerClientError::AuthRequired)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}
