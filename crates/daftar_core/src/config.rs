//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve data/log locations and log level.
//! - Assemble hosted auth settings when both URL and key are present.
//!
//! # Invariants
//! - All resolved paths are absolute.
//! - Auth is either fully configured or absent; a URL without a key (or the
//!   reverse) is an error.

use crate::auth::gate::GateCredentials;
use crate::auth::hosted::HostedAuthConfig;
use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "DAFTAR_DATA_DIR";
pub const LOG_LEVEL_VAR: &str = "DAFTAR_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "DAFTAR_LOG_DIR";
pub const AUTH_URL_VAR: &str = "DAFTAR_AUTH_URL";
pub const AUTH_ANON_KEY_VAR: &str = "DAFTAR_AUTH_ANON_KEY";
pub const AUTH_USERNAME_VAR: &str = "DAFTAR_AUTH_USERNAME";
pub const AUTH_EMAIL_VAR: &str = "DAFTAR_AUTH_EMAIL";
pub const AUTH_DEFAULT_PASSWORD_VAR: &str = "DAFTAR_AUTH_DEFAULT_PASSWORD";
pub const AUTH_REDIRECT_URL_VAR: &str = "DAFTAR_AUTH_REDIRECT_URL";

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_EMAIL: &str = "admin@daftar.local";
const DB_FILE_NAME: &str = "daftar.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
    /// Only one of URL / anon key was set.
    IncompleteAuth { missing: &'static str },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid {key}: {message}"),
            Self::IncompleteAuth { missing } => {
                write!(f, "auth is partially configured; {missing} is not set")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub hosted: HostedAuthConfig,
    pub credentials: GateCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
    /// `None` when auth is not configured.
    pub auth: Option<AuthSettings>,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|err| ConfigError::InvalidValue {
            key: DATA_DIR_VAR,
            message: format!("cannot resolve working directory: {err}"),
        })?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Builds configuration from `lookup`; relative paths resolve against
    /// `base_dir`.
    pub fn from_lookup<F>(lookup: F, base_dir: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = match read(DATA_DIR_VAR) {
            Some(dir) => absolutize(base_dir, &dir),
            None => std::env::temp_dir().join("daftar"),
        };
        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => normalize_level(&level).map_err(|err| ConfigError::InvalidValue {
                key: LOG_LEVEL_VAR,
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };
        let log_dir = match read(LOG_DIR_VAR) {
            Some(dir) => absolutize(base_dir, &dir),
            None => data_dir.join("logs"),
        };

        let auth = match (read(AUTH_URL_VAR), read(AUTH_ANON_KEY_VAR)) {
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompleteAuth {
                    missing: AUTH_ANON_KEY_VAR,
                })
            }
            (None, Some(_)) => return Err(ConfigError::IncompleteAuth { missing: AUTH_URL_VAR }),
            (Some(base_url), Some(anon_key)) => {
                validate_http_url(AUTH_URL_VAR, &base_url)?;
                let reset_redirect_url = read(AUTH_REDIRECT_URL_VAR);
                if let Some(redirect) = &reset_redirect_url {
                    validate_http_url(AUTH_REDIRECT_URL_VAR, redirect)?;
                }
                Some(AuthSettings {
                    hosted: HostedAuthConfig { base_url, anon_key },
                    credentials: GateCredentials {
                        username: read(AUTH_USERNAME_VAR)
                            .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
                        email: read(AUTH_EMAIL_VAR).unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
                        // Passwords are taken verbatim, surrounding spaces included.
                        default_password: lookup(AUTH_DEFAULT_PASSWORD_VAR)
                            .filter(|value| !value.is_empty()),
                        reset_redirect_url,
                    },
                })
            }
        };

        Ok(Self {
            data_dir,
            log_level,
            log_dir,
            auth,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn absolutize(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn validate_http_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value).map_err(|err| ConfigError::InvalidValue {
        key,
        message: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue {
            key,
            message: format!("unsupported scheme `{other}`"),
        }),
    }
}
