//! REST client for the hosted auth provider.
//!
//! # Responsibility
//! - Translate provider operations into `/auth/v1` HTTP calls.
//! - Hold the current session and move it in and out of the local store.
//!
//! # Invariants
//! - Every request carries the project `apikey` header.
//! - A session rejected by the provider (401/403) or past `expires_at` is
//!   dropped locally.

use crate::auth::provider::{AuthError, AuthProvider, AuthResult, AuthUser, Session};
use crate::auth::transport::{
    HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, RetryPolicy, RetryingTransport,
    Transport,
};
use crate::storage::local_store::{
    load_json, save_json, LocalStore, StoreResult, AUTH_SESSION_KEY,
};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard};

const AUTH_PATH: &str = "/auth/v1";
const ERROR_MESSAGE_KEYS: [&str; 4] = ["error_description", "msg", "message", "error"];

/// Project endpoint and public key.
#[derive(Clone, PartialEq, Eq)]
pub struct HostedAuthConfig {
    pub base_url: String,
    pub anon_key: String,
}

impl std::fmt::Debug for HostedAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAuthConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

/// Hosted provider client over any transport.
pub struct HostedAuthProvider<T: Transport> {
    config: HostedAuthConfig,
    transport: T,
    session: Mutex<Option<Session>>,
}

impl HostedAuthProvider<RetryingTransport<ReqwestTransport>> {
    /// Builds a client on the blocking `reqwest` transport with default retry.
    pub fn connect(config: HostedAuthConfig) -> AuthResult<Self> {
        let transport = RetryingTransport::new(ReqwestTransport::new()?, RetryPolicy::default());
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> HostedAuthProvider<T> {
    pub fn new(config: HostedAuthConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session: Mutex::new(None),
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session_slot().clone()
    }

    pub fn restore_session(&self, session: Option<Session>) {
        *self.session_slot() = session;
    }

    /// Loads a session saved by `save_session`.
    pub fn load_session<S: LocalStore + ?Sized>(&self, store: &S) -> StoreResult<()> {
        let session: Option<Session> = load_json(store, AUTH_SESSION_KEY)?;
        self.restore_session(session);
        Ok(())
    }

    /// Writes the current session, or clears the key when signed out.
    pub fn save_session<S: LocalStore + ?Sized>(&self, store: &S) -> StoreResult<()> {
        match self.current_session() {
            Some(session) => save_json(store, AUTH_SESSION_KEY, &session),
            None => store.remove_item(AUTH_SESSION_KEY),
        }
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{AUTH_PATH}{path}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<Value>) -> HttpRequest {
        let request = match (method, body) {
            (HttpMethod::Post, Some(body)) => HttpRequest::post_json(url, &body),
            (HttpMethod::Post, None) => HttpRequest::post_json(url, &json!({})),
            (HttpMethod::Get, _) => HttpRequest::get(url),
        };
        request
            .with_header("apikey", self.config.anon_key.as_str())
            .with_header(
                "Authorization",
                format!("Bearer {}", self.config.anon_key),
            )
    }

    fn execute(&self, request: &HttpRequest) -> AuthResult<HttpResponse> {
        let response = self.transport.send(request)?;
        if response.is_success() {
            return Ok(response);
        }
        Err(AuthError::Rejected {
            status: response.status,
            message: error_message(&response),
        })
    }
}

impl<T: Transport> AuthProvider for HostedAuthProvider<T> {
    fn get_session(&self) -> AuthResult<Option<Session>> {
        let Some(mut session) = self.current_session() else {
            return Ok(None);
        };
        if session.is_expired_at(Utc::now().timestamp()) {
            info!("event=auth_session module=auth status=expired");
            self.restore_session(None);
            return Ok(None);
        }

        let request = self
            .request(HttpMethod::Get, self.endpoint("/user"), None)
            .with_header(
                "Authorization",
                format!("Bearer {}", session.access_token),
            );
        match self.execute(&request) {
            Ok(response) => {
                session.user = serde_json::from_str(&response.body)
                    .map_err(|err| AuthError::Decode(err.to_string()))?;
                self.restore_session(Some(session.clone()));
                Ok(Some(session))
            }
            Err(AuthError::Rejected { status, .. }) if status == 401 || status == 403 => {
                info!("event=auth_session module=auth status=revoked http_status={status}");
                self.restore_session(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        let request = self.request(
            HttpMethod::Post,
            self.endpoint("/token?grant_type=password"),
            Some(json!({ "email": email, "password": password })),
        );
        let response = self.execute(&request)?;
        let token: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|err| AuthError::Decode(err.to_string()))?;

        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|seconds| Utc::now().timestamp() + seconds)
        });
        let session = Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        };
        self.restore_session(Some(session.clone()));
        Ok(session)
    }

    fn sign_up(&self, email: &str, password: &str) -> AuthResult<()> {
        let request = self.request(
            HttpMethod::Post,
            self.endpoint("/signup"),
            Some(json!({ "email": email, "password": password })),
        );
        self.execute(&request)?;
        Ok(())
    }

    fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> AuthResult<()> {
        let base = self.endpoint("/recover");
        let url = match redirect_to {
            Some(target) => reqwest::Url::parse_with_params(&base, &[("redirect_to", target)])
                .map_err(|err| AuthError::Decode(format!("invalid redirect url: {err}")))?
                .to_string(),
            None => base,
        };
        let request = self.request(HttpMethod::Post, url, Some(json!({ "email": email })));
        self.execute(&request)?;
        Ok(())
    }

    fn sign_out(&self) -> AuthResult<()> {
        let Some(session) = self.session_slot().take() else {
            return Ok(());
        };
        let request = self
            .request(HttpMethod::Post, self.endpoint("/logout"), None)
            .with_header(
                "Authorization",
                format!("Bearer {}", session.access_token),
            );
        if let Err(err) = self.execute(&request) {
            warn!("event=auth_sign_out module=auth status=error error={err}");
        }
        Ok(())
    }
}

fn error_message(response: &HttpResponse) -> String {
    let from_json = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|value| {
            ERROR_MESSAGE_KEYS
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        });
    match from_json {
        Some(message) => message,
        None if !response.body.trim().is_empty() => response.body.trim().to_string(),
        None => format!("http status {}", response.status),
    }
}
