//! HTTP clients for the cozy backend services.
//!
//! Each service has its own base URL and its own client type; they share the
//! request plumbing in [`ServiceClient`].

mod auth;
mod calendars;
mod events;
mod tasks;

pub use auth::AuthClient;
pub use calendars::CalendarClient;
pub use events::EventClient;
pub use tasks::TaskClient;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CozyError, CozyResult};

/// Build the shared reqwest client. One instance backs every service client.
pub fn http_client(timeout: Duration) -> CozyResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CozyError::Config(format!("Could not build HTTP client: {e}")))
}

/// Error bodies come in a few shapes: `{"message": ...}`, `{"error": ...}`,
/// or plain text from `http.Error`.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn server_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return Some(message);
        }
    }

    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Request plumbing for one backend service: base URL, bearer token and
/// status-code mapping.
#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ServiceClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        ServiceClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> CozyResult<Response> {
        debug!(%method, url = %format!("{}{}", self.base_url, path), "sending request");

        let resp = builder.send().await?;
        let status = resp.status();

        if status.is_success() {
            debug!(%method, path, status = status.as_u16(), "request succeeded");
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = server_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        warn!(%method, path, status = status.as_u16(), %message, "request failed");

        Err(CozyError::Http {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> CozyResult<T> {
        let builder = self.request(Method::GET, path);
        Ok(self.send(Method::GET, path, builder).await?.json().await?)
    }

    /// Go handlers encode an empty slice as `null`; treat that as an empty list.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> CozyResult<Vec<T>> {
        let builder = self.request(Method::GET, path).query(query);
        let items: Option<Vec<T>> = self.send(Method::GET, path, builder).await?.json().await?;
        Ok(items.unwrap_or_default())
    }

    pub(crate) async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> CozyResult<T> {
        let builder = self.request(method.clone(), path).json(body);
        Ok(self.send(method, path, builder).await?.json().await?)
    }

    /// Send a body and ignore whatever comes back.
    pub(crate) async fn send_json_unit<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> CozyResult<()> {
        let builder = self.request(method.clone(), path).json(body);
        self.send(method, path, builder).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> CozyResult<()> {
        let builder = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_json_fields() {
        assert_eq!(
            server_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            server_message(r#"{"error":"calendar not found"}"#).as_deref(),
            Some("calendar not found")
        );
    }

    #[test]
    fn server_message_falls_back_to_text() {
        assert_eq!(
            server_message("Missing required fields (title, start_time, end_time)\n").as_deref(),
            Some("Missing required fields (title, start_time, end_time)")
        );
        assert_eq!(server_message("  "), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ServiceClient::new(reqwest::Client::new(), "http://localhost:8081/", None);
        assert_eq!(client.base_url(), "http://localhost:8081");
    }
}
