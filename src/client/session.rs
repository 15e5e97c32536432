use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::client::store::{SessionStore, StoredUser};
use crate::models::Role;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: serde_json::Value,
    pub role: Role,
}

/// App-lifetime auth state over the REST backend and a [`SessionStore`].
pub struct SessionContext {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    session: Option<Session>,
}

#[derive(Deserialize)]
struct LoginPayload {
    token: String,
    user: serde_json::Value,
    role: Role,
}

#[derive(Deserialize)]
struct VerifyPayload {
    user: serde_json::Value,
    role: Role,
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: String,
}

impl SessionContext {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            session: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(|s| s.role)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticates against the backend and persists the session.
    pub async fn login(&mut self, user_id: &str, password: &str, role: Role) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({
                "userId": user_id,
                "password": password,
                "role": role,
            }))
            .send()
            .await
            .context("login request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorPayload>()
                .await
                .map(|payload| payload.message)
                .unwrap_or_else(|_| status.to_string());
            bail!("login rejected ({status}): {message}");
        }

        let payload: LoginPayload = response
            .json()
            .await
            .context("failed to parse login response")?;

        self.store.store_token(&payload.token).await?;
        let stored = StoredUser {
            user: payload.user.clone(),
            role: payload.role,
        };
        if let Err(err) = self.store.store_user(&stored).await {
            // Don't leave a token on disk with no user record behind it.
            let _ = self.store.clear_all().await;
            return Err(err);
        }

        self.session = Some(Session {
            token: payload.token,
            user: payload.user,
            role: payload.role,
        });
        Ok(())
    }

    /// Clears the session locally; the backend logout call is best-effort.
    pub async fn logout(&mut self) -> Result<()> {
        if let Some(session) = &self.session {
            let _ = self
                .client
                .post(self.url("/api/auth/logout"))
                .bearer_auth(&session.token)
                .send()
                .await;
        }

        self.store.clear_all().await?;
        self.session = None;
        Ok(())
    }

    /// Called at app launch: verifies a persisted token and rehydrates the
    /// session. A stale or rejected token clears the on-device state.
    pub async fn restore_session(&mut self) -> Result<bool> {
        let Some(token) = self.store.load_token().await? else {
            self.session = None;
            return Ok(false);
        };

        let response = self
            .client
            .get(self.url("/api/auth/verify"))
            .bearer_auth(&token)
            .send()
            .await
            .context("verify request failed")?;

        if !response.status().is_success() {
            self.store.clear_all().await?;
            self.session = None;
            return Ok(false);
        }

        let verified: VerifyPayload = response
            .json()
            .await
            .context("failed to parse verify response")?;

        // The verify payload only carries the token's identity fields;
        // prefer the record persisted at login.
        let (user, role) = match self.store.load_user().await? {
            Some(stored) => (stored.user, stored.role),
            None => (verified.user, verified.role),
        };

        self.session = Some(Session { token, user, role });
        Ok(true)
    }
}
