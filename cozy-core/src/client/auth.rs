use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use super::ServiceClient;
use crate::error::{CozyError, CozyResult};
use crate::model::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::validate::Validate;

#[derive(Deserialize)]
struct RegisterResponse {
    message: Option<String>,
}

/// Auth service: `POST /login`, `POST /register`, `GET /me`.
#[derive(Clone)]
pub struct AuthClient {
    inner: ServiceClient,
}

impl AuthClient {
    pub fn new(inner: ServiceClient) -> Self {
        AuthClient { inner }
    }

    /// POST /login
    pub async fn login(&self, req: &LoginRequest) -> CozyResult<AuthResponse> {
        req.validate()?;

        let resp: AuthResponse = self.inner.send_json(Method::POST, "/login", req).await?;
        if resp.token.is_empty() {
            return Err(CozyError::Serialization(
                "Invalid response structure from login API".into(),
            ));
        }

        info!(user_id = resp.user.id, "logged in");
        Ok(resp)
    }

    /// POST /register. Returns the service's confirmation message.
    /// Registration does not log the user in.
    pub async fn register(&self, req: &RegisterRequest) -> CozyResult<String> {
        req.validate()?;

        let resp: RegisterResponse = self.inner.send_json(Method::POST, "/register", req).await?;
        Ok(resp
            .message
            .unwrap_or_else(|| "Registration successful".to_string()))
    }

    /// GET /me
    pub async fn me(&self) -> CozyResult<User> {
        self.inner.get("/me").await
    }
}
