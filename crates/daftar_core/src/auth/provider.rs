//! Auth provider capability.

use crate::auth::transport::TransportError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix epoch seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired_at(&self, now_epoch_secs: i64) -> bool {
        self.expires_at
            .map(|expires_at| expires_at <= now_epoch_secs)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Provider call failure.
#[derive(Debug)]
pub enum AuthError {
    /// Provider answered with a non-2xx status.
    Rejected { status: u16, message: String },
    /// No HTTP response could be obtained.
    Transport(TransportError),
    /// Provider answered 2xx with a body we could not read.
    Decode(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { status, message } => {
                write!(f, "auth provider rejected request ({status}): {message}")
            }
            Self::Transport(err) => write!(f, "{err}"),
            Self::Decode(message) => write!(f, "invalid auth provider response: {message}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for AuthError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

/// Hosted auth capability injected into the gate.
pub trait AuthProvider {
    /// Returns the live session, if any.
    fn get_session(&self) -> AuthResult<Option<Session>>;
    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session>;
    fn sign_up(&self, email: &str, password: &str) -> AuthResult<()>;
    fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> AuthResult<()>;
    /// Drops the local session; remote revocation is best effort.
    fn sign_out(&self) -> AuthResult<()>;
}

impl<P: AuthProvider + ?Sized> AuthProvider for &P {
    fn get_session(&self) -> AuthResult<Option<Session>> {
        (**self).get_session()
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Session> {
        (**self).sign_in_with_password(email, password)
    }

    fn sign_up(&self, email: &str, password: &str) -> AuthResult<()> {
        (**self).sign_up(email, password)
    }

    fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> AuthResult<()> {
        (**self).reset_password_for_email(email, redirect_to)
    }

    fn sign_out(&self) -> AuthResult<()> {
        (**self).sign_out()
    }
}
