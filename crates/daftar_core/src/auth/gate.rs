//! Single-user login gate.
//!
//! # Responsibility
//! - Check for a live session.
//! - Map the one recognised username to its backing email and sign in.
//! - Provision the account once when the default password is used against a
//!   missing account.
//! - Request password reset emails.
//!
//! # Invariants
//! - At most one login/reset runs at a time; overlapping calls get
//!   `AuthGateError::Busy` and never reach the provider.
//! - `login` makes at most one sign-up and two sign-in calls.

use crate::auth::provider::{AuthError, AuthProvider};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

/// Account policy for the gate.
#[derive(Clone, PartialEq, Eq)]
pub struct GateCredentials {
    /// The only username accepted at the login form.
    pub username: String,
    /// Provider account the username maps to.
    pub email: String,
    /// Password that triggers first-use provisioning; `None` disables it.
    pub default_password: Option<String>,
    /// Where the reset email should send the user back to.
    pub reset_redirect_url: Option<String>,
}

impl std::fmt::Debug for GateCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateCredentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field(
                "default_password",
                &self.default_password.as_ref().map(|_| "<redacted>"),
            )
            .field("reset_redirect_url", &self.reset_redirect_url)
            .finish()
    }
}

/// Result of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidUsername,
    InvalidPassword,
    UnexpectedError,
}

impl LoginOutcome {
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Success => "تم تسجيل الدخول بنجاح",
            Self::InvalidUsername => "اسم المستخدم غير صحيح",
            Self::InvalidPassword => "كلمة المرور غير صحيحة",
            Self::UnexpectedError => "حدث خطأ غير متوقع أثناء تسجيل الدخول",
        }
    }
}

/// Result of a password reset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthGateError {
    /// Another login or reset is still running.
    Busy,
}

impl Display for AuthGateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "another authentication request is in progress"),
        }
    }
}

impl Error for AuthGateError {}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AuthGateError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| AuthGateError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Login gate over an injected provider.
pub struct AuthGate<P: AuthProvider> {
    provider: P,
    credentials: GateCredentials,
    in_flight: AtomicBool,
}

impl<P: AuthProvider> AuthGate<P> {
    pub fn new(provider: P, credentials: GateCredentials) -> Self {
        Self {
            provider,
            credentials,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn credentials(&self) -> &GateCredentials {
        &self.credentials
    }

    /// Whether a login or reset is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Returns `true` when the provider reports a live session.
    ///
    /// Provider failures are logged and reported as `false`.
    pub fn check_session(&self) -> bool {
        match self.provider.get_session() {
            Ok(session) => {
                info!(
                    "event=auth_check_session module=auth status=ok authenticated={}",
                    session.is_some()
                );
                session.is_some()
            }
            Err(err) => {
                error!("event=auth_check_session module=auth status=error error={err}");
                false
            }
        }
    }

    /// Attempts to sign in the recognised user.
    ///
    /// # Errors
    /// - `Busy` when another login/reset has not finished.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthGateError> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;

        if username != self.credentials.username {
            warn!("event=auth_login module=auth status=rejected reason=invalid_username");
            return Ok(LoginOutcome::InvalidUsername);
        }

        let outcome = match self
            .provider
            .sign_in_with_password(&self.credentials.email, password)
        {
            Ok(_) => LoginOutcome::Success,
            Err(AuthError::Rejected { status, .. }) if self.is_default_password(password) => {
                info!("event=auth_login module=auth status=provisioning http_status={status}");
                self.provision_and_sign_in(password)
            }
            Err(AuthError::Rejected { status, .. }) => {
                warn!(
                    "event=auth_login module=auth status=rejected reason=invalid_password \
                     http_status={status}"
                );
                LoginOutcome::InvalidPassword
            }
            Err(err) => {
                error!("event=auth_login module=auth status=error error={err}");
                LoginOutcome::UnexpectedError
            }
        };

        if outcome == LoginOutcome::Success {
            info!("event=auth_login module=auth status=ok");
        }
        Ok(outcome)
    }

    /// Sends a password reset email to the backing account.
    pub fn reset_password(&self) -> Result<ResetOutcome, AuthGateError> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;

        match self.provider.reset_password_for_email(
            &self.credentials.email,
            self.credentials.reset_redirect_url.as_deref(),
        ) {
            Ok(()) => {
                info!("event=auth_reset_password module=auth status=ok");
                Ok(ResetOutcome::Sent)
            }
            Err(err) => {
                error!("event=auth_reset_password module=auth status=error error={err}");
                let message = match err {
                    AuthError::Rejected { message, .. } => message,
                    other => other.to_string(),
                };
                Ok(ResetOutcome::Failed(message))
            }
        }
    }

    /// Ends the local session.
    pub fn sign_out(&self) -> Result<(), AuthGateError> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        if let Err(err) = self.provider.sign_out() {
            warn!("event=auth_sign_out module=auth status=error error={err}");
        }
        Ok(())
    }

    fn is_default_password(&self, password: &str) -> bool {
        self.credentials.default_password.as_deref() == Some(password)
    }

    fn provision_and_sign_in(&self, password: &str) -> LoginOutcome {
        if let Err(err) = self.provider.sign_up(&self.credentials.email, password) {
            error!("event=auth_provision module=auth status=error error={err}");
            return LoginOutcome::UnexpectedError;
        }
        info!("event=auth_provision module=auth status=ok");

        match self
            .provider
            .sign_in_with_password(&self.credentials.email, password)
        {
            Ok(_) => LoginOutcome::Success,
            Err(err) => {
                error!(
                    "event=auth_login module=auth status=error stage=after_provision error={err}"
                );
                LoginOutcome::UnexpectedError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthGate, AuthGateError, GateCredentials, LoginOutcome, ResetOutcome};
    use crate::auth::provider::{AuthError, AuthProvider, AuthResult, AuthUser, Session};
    use crate::auth::transport::TransportError;
    use std::collections::VecDeque;
    use std::sync::{Barrier, Mutex};

    #[derive(Default)]
    struct FakeProvider {
        sign_in_replies: Mutex<VecDeque<AuthResult<Session>>>,
        sign_up_reply: Mutex<Option<AuthResult<()>>>,
        reset_reply: Mutex<Option<AuthResult<()>>>,
        session: Mutex<Option<AuthResult<Option<Session>>>>,
        calls: Mutex<Vec<String>>,
        gate_barrier: Option<Barrier>,
    }

    impl FakeProvider {
        fn with_sign_in(replies: Vec<AuthResult<Session>>) -> Self {
            Self {
                sign_in_replies: Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl AuthProvider for FakeProvider {
        fn get_session(&self) -> AuthResult<Option<Session>> {
            self.record("get_session".to_string());
            self.session.lock().unwrap().take().unwrap_or(Ok(None))
        }

        fn sign_in_with_password(&self, email: &str, _password: &str) -> AuthResult<Session> {
            self.record(format!("sign_in:{email}"));
            if let Some(barrier) = &self.gate_barrier {
                barrier.wait();
                barrier.wait();
            }
            self.sign_in_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(rejected(400)))
        }

        fn sign_up(&self, email: &str, _password: &str) -> AuthResult<()> {
            self.record(format!("sign_up:{email}"));
            self.sign_up_reply.lock().unwrap().take().unwrap_or(Ok(()))
        }

        fn reset_password_for_email(
            &self,
            email: &str,
            redirect_to: Option<&str>,
        ) -> AuthResult<()> {
            self.record(format!("reset:{email}:{}", redirect_to.unwrap_or("-")));
            self.reset_reply.lock().unwrap().take().unwrap_or(Ok(()))
        }

        fn sign_out(&self) -> AuthResult<()> {
            self.record("sign_out".to_string());
            Ok(())
        }
    }

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: "u-1".to_string(),
                email: Some("admin@daftar.local".to_string()),
            },
        }
    }

    fn rejected(status: u16) -> AuthError {
        AuthError::Rejected {
            status,
            message: "Invalid login credentials".to_string(),
        }
    }

    fn credentials() -> GateCredentials {
        GateCredentials {
            username: "admin".to_string(),
            email: "admin@daftar.local".to_string(),
            default_password: Some("first-run".to_string()),
            reset_redirect_url: Some("https://app.test/reset".to_string()),
        }
    }

    #[test]
    fn unknown_username_never_reaches_provider() {
        let gate = AuthGate::new(FakeProvider::default(), credentials());
        let outcome = gate.login("wrong", "x").unwrap();
        assert_eq!(outcome, LoginOutcome::InvalidUsername);
        assert_eq!(outcome.user_message(), "اسم المستخدم غير صحيح");
        assert!(gate.provider().calls().is_empty());
    }

    #[test]
    fn known_username_signs_in_with_mapped_email() {
        let gate = AuthGate::new(FakeProvider::with_sign_in(vec![Ok(session())]), credentials());
        assert_eq!(gate.login("admin", "secret").unwrap(), LoginOutcome::Success);
        assert_eq!(gate.provider().calls(), vec!["sign_in:admin@daftar.local"]);
        assert!(!gate.is_busy());
    }

    #[test]
    fn rejected_non_default_password_is_invalid_password() {
        let gate = AuthGate::new(
            FakeProvider::with_sign_in(vec![Err(rejected(400))]),
            credentials(),
        );
        let outcome = gate.login("admin", "nope").unwrap();
        assert_eq!(outcome, LoginOutcome::InvalidPassword);
        assert_eq!(outcome.user_message(), "كلمة المرور غير صحيحة");
        assert_eq!(gate.provider().calls().len(), 1);
    }

    #[test]
    fn default_password_provisions_account_then_signs_in() {
        let gate = AuthGate::new(
            FakeProvider::with_sign_in(vec![Err(rejected(400)), Ok(session())]),
            credentials(),
        );
        assert_eq!(gate.login("admin", "first-run").unwrap(), LoginOutcome::Success);
        assert_eq!(
            gate.provider().calls(),
            vec![
                "sign_in:admin@daftar.local",
                "sign_up:admin@daftar.local",
                "sign_in:admin@daftar.local",
            ]
        );
    }

    #[test]
    fn provisioning_failures_are_unexpected() {
        let provider = FakeProvider::with_sign_in(vec![Err(rejected(400))]);
        *provider.sign_up_reply.lock().unwrap() = Some(Err(rejected(422)));
        let gate = AuthGate::new(provider, credentials());
        assert_eq!(
            gate.login("admin", "first-run").unwrap(),
            LoginOutcome::UnexpectedError
        );
        assert_eq!(gate.provider().calls().len(), 2);

        let gate = AuthGate::new(
            FakeProvider::with_sign_in(vec![Err(rejected(400)), Err(rejected(400))]),
            credentials(),
        );
        assert_eq!(
            gate.login("admin", "first-run").unwrap(),
            LoginOutcome::UnexpectedError
        );
        assert_eq!(gate.provider().calls().len(), 3);
    }

    #[test]
    fn provisioning_disabled_without_default_password() {
        let mut creds = credentials();
        creds.default_password = None;
        let gate = AuthGate::new(FakeProvider::with_sign_in(vec![Err(rejected(400))]), creds);
        assert_eq!(
            gate.login("admin", "first-run").unwrap(),
            LoginOutcome::InvalidPassword
        );
    }

    #[test]
    fn transport_failure_is_unexpected_error() {
        let gate = AuthGate::new(
            FakeProvider::with_sign_in(vec![Err(AuthError::Transport(TransportError::Send(
                "offline".to_string(),
            )))]),
            credentials(),
        );
        let outcome = gate.login("admin", "first-run").unwrap();
        assert_eq!(outcome, LoginOutcome::UnexpectedError);
        assert_eq!(outcome.user_message(), "حدث خطأ غير متوقع أثناء تسجيل الدخول");
    }

    #[test]
    fn check_session_reports_presence_and_swallows_errors() {
        let provider = FakeProvider::default();
        *provider.session.lock().unwrap() = Some(Ok(Some(session())));
        let gate = AuthGate::new(provider, credentials());
        assert!(gate.check_session());
        assert!(!gate.check_session());

        *gate.provider().session.lock().unwrap() = Some(Err(AuthError::Decode("bad".to_string())));
        assert!(!gate.check_session());
    }

    #[test]
    fn reset_password_uses_mapped_email_and_redirect() {
        let gate = AuthGate::new(FakeProvider::default(), credentials());
        assert_eq!(gate.reset_password().unwrap(), ResetOutcome::Sent);
        assert_eq!(
            gate.provider().calls(),
            vec!["reset:admin@daftar.local:https://app.test/reset"]
        );

        *gate.provider().reset_reply.lock().unwrap() = Some(Err(AuthError::Rejected {
            status: 429,
            message: "rate limited".to_string(),
        }));
        assert_eq!(
            gate.reset_password().unwrap(),
            ResetOutcome::Failed("rate limited".to_string())
        );
    }

    #[test]
    fn overlapping_login_is_rejected_as_busy() {
        let provider = FakeProvider {
            sign_in_replies: Mutex::new(vec![Ok(session())].into()),
            gate_barrier: Some(Barrier::new(2)),
            ..FakeProvider::default()
        };
        let gate = AuthGate::new(provider, credentials());

        std::thread::scope(|scope| {
            let first = scope.spawn(|| gate.login("admin", "secret"));

            let barrier = gate.provider().gate_barrier.as_ref().unwrap();
            barrier.wait();
            assert!(gate.is_busy());
            assert_eq!(gate.login("admin", "secret"), Err(AuthGateError::Busy));
            assert_eq!(gate.reset_password(), Err(AuthGateError::Busy));
            barrier.wait();

            assert_eq!(first.join().unwrap(), Ok(LoginOutcome::Success));
        });

        assert!(!gate.is_busy());
        assert_eq!(gate.provider().calls(), vec!["sign_in:admin@daftar.local"]);
    }
}
