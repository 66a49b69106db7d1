//! Authentication methods for the Vibefy server.

use crate::error::{Result, ServerClientError};
use crate::types::{LoginRequest, LoginResponse, SignupRequest, SESSION_COOKIE};
use reqwest::header::SET_COOKIE;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

/// Authentication client for the Vibefy server.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Login with email and password.
    ///
    /// Returns the session cookie value on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let url = format!("{}/api/login", self.base_url);
        debug!(url = %url, email = %email, "Attempting login");

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            // The server keys sessions by email; use it if the cookie was stripped
            let session = session_cookie(&response).unwrap_or_else(|| email.to_string());
            let message = response.text().await.unwrap_or_default();

            info!(email = %email, "Login successful");
            Ok(LoginResponse { message, session })
        } else if status.as_u16() == 401 {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Login failed: invalid credentials");
            Err(ServerClientError::AuthFailed(if error_text.is_empty() {
                "Invalid email or password".to_string()
            } else {
                error_text
            }))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }

    /// Register a new account.
    ///
    /// Returns the server's message. The server answers 200 with an
    /// explanatory message for some refusals (e.g. email already in use).
    pub async fn signup(&self, email: &str, username: &str, password: &str) -> Result<String> {
        let url = format!("{}/api/register", self.base_url);
        debug!(url = %url, email = %email, username = %username, "Registering account");

        let request = SignupRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        let status = response.status();
        let message = response.text().await.unwrap_or_default();

        if status.is_success() {
            info!(email = %email, message = %message, "Signup answered");
            Ok(message)
        } else {
            Err(ServerClientError::ServerError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Value of the session cookie among the `Set-Cookie` headers, if any
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(parse_session_cookie)
}

fn parse_session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.trim() == SESSION_COOKIE && !value.is_empty() {
        Some(value.trim_matches('"').to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_cookie() {
        assert_eq!(
            parse_session_cookie("vibe_session=me@example.com; Max-Age=2592000; Path=/; HttpOnly"),
            Some("me@example.com".to_string())
        );
        assert_eq!(parse_session_cookie("other=1; Path=/"), None);
        assert_eq!(parse_session_cookie("vibe_session=; Path=/"), None);
    }
}
