//! Authentication use-case service.
//!
//! # Responsibility
//! - Wrap an identity provider behind success-flag-plus-message outcomes.
//! - Mirror the signed-in identity into the single-row user cache.
//! - Publish the current user to observers.
//!
//! # Invariants
//! - At most one user is cached; every successful sign-in replaces it.
//! - Sign-out clears the cache even when the provider keeps no session.
//! - Credentials and emails never reach the logs.

use crate::model::user::User;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

/// Message shown when sign-up hits an address that is already registered.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "An account with this email already exists.";
const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password must not be empty.";
const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
const MISSING_TOKEN_MESSAGE: &str = "Missing identity token.";
const GENERIC_FAILURE_MESSAGE: &str = "Authentication failed.";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static DUPLICATE_EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(already\s+(in\s+use|exists|registered)|email[-_]already[-_]in[-_]use)")
        .expect("valid duplicate email regex")
});

/// Identity returned by the provider after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Provider failure carrying the provider's own (possibly missing) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub message: Option<String>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE)
        )
    }
}

impl Error for ProviderError {}

/// Boundary to the third-party identity service.
pub trait IdentityProvider: Send + Sync {
    fn sign_in_with_email(&self, email: &str, password: &str)
        -> Result<ProviderUser, ProviderError>;
    fn create_user_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError>;
    /// Federated sign-in with an identity token issued by an external IdP.
    fn sign_in_with_id_token(&self, id_token: &str) -> Result<ProviderUser, ProviderError>;
    /// Sign-in methods registered for `email` (for example `password`).
    fn fetch_sign_in_methods(&self, email: &str) -> Result<Vec<String>, ProviderError>;
    fn sign_out(&self);
}

/// Result envelope handed back to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    /// Human-readable reason when `success` is false.
    pub message: Option<String>,
}

impl AuthOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Which sign-in flow produced a provider result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    EmailSignIn,
    EmailSignUp,
    IdToken,
}

impl AuthFlow {
    fn as_str(self) -> &'static str {
        match self {
            Self::EmailSignIn => "email",
            Self::EmailSignUp => "email_sign_up",
            Self::IdToken => "id_token",
        }
    }
}

/// Authentication manager over a provider and a user cache.
pub struct AuthManager<P: IdentityProvider, R: UserRepository> {
    provider: P,
    users: R,
    current: watch::Sender<Option<User>>,
}

impl<P: IdentityProvider, R: UserRepository> AuthManager<P, R> {
    /// Creates the manager and loads any user cached by a previous session.
    pub fn new(provider: P, users: R) -> RepoResult<Self> {
        let cached = users.current_user()?;
        let (current, _) = watch::channel(cached);
        Ok(Self {
            provider,
            users,
            current,
        })
    }

    /// Observes the signed-in user. `None` means signed out.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Re-reads the cached user from storage and republishes it.
    pub fn restore_session(&self) -> RepoResult<Option<User>> {
        let cached = self.users.current_user()?;
        self.current.send_replace(cached.clone());
        Ok(cached)
    }

    /// Email/password sign-in.
    ///
    /// Provider failures come back as a failed outcome; storage failures
    /// propagate as errors.
    pub fn sign_in_with_email(&self, email: &str, password: &str) -> RepoResult<AuthOutcome> {
        let email = email.trim();
        if let Some(rejection) = validate_credentials(email, password) {
            return Ok(rejection);
        }
        let result = self.provider.sign_in_with_email(email, password);
        self.complete_sign_in(AuthFlow::EmailSignIn, result, email)
    }

    /// Email/password account creation. Duplicate addresses are reported
    /// with [`DUPLICATE_EMAIL_MESSAGE`].
    pub fn sign_up_with_email(&self, email: &str, password: &str) -> RepoResult<AuthOutcome> {
        let email = email.trim();
        if let Some(rejection) = validate_credentials(email, password) {
            return Ok(rejection);
        }
        let result = self.provider.create_user_with_email(email, password);
        self.complete_sign_in(AuthFlow::EmailSignUp, result, email)
    }

    /// Federated sign-in with an identity token from an external IdP.
    pub fn sign_in_with_id_token(&self, id_token: &str) -> RepoResult<AuthOutcome> {
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Ok(AuthOutcome::failure(MISSING_TOKEN_MESSAGE));
        }
        let result = self.provider.sign_in_with_id_token(id_token);
        self.complete_sign_in(AuthFlow::IdToken, result, "")
    }

    /// Lists sign-in methods known for `email`, or the provider's message.
    pub fn fetch_sign_in_methods(&self, email: &str) -> Result<Vec<String>, String> {
        self.provider
            .fetch_sign_in_methods(email.trim())
            .map_err(|err| err.to_string())
    }

    /// Signs out of the provider and clears the cached user.
    pub fn sign_out(&self) -> RepoResult<()> {
        self.provider.sign_out();
        self.users.clear_users()?;
        self.current.send_replace(None);
        info!("event=auth_sign_out module=auth status=ok");
        Ok(())
    }

    /// Applies a provider result obtained for `flow`.
    ///
    /// Used directly when the provider runs in the host app. Sign-up
    /// failures are reworded by [`friendly_sign_up_message`]; `fallback_email`
    /// fills in a missing provider email.
    pub fn complete_sign_in(
        &self,
        flow: AuthFlow,
        result: Result<ProviderUser, ProviderError>,
        fallback_email: &str,
    ) -> RepoResult<AuthOutcome> {
        let result = match flow {
            AuthFlow::EmailSignUp => result.map_err(|err| ProviderError {
                message: Some(friendly_sign_up_message(err.message.as_deref())),
            }),
            AuthFlow::EmailSignIn | AuthFlow::IdToken => result,
        };
        match result {
            Ok(identity) => {
                let user = User {
                    uid: identity.uid,
                    email: identity
                        .email
                        .unwrap_or_else(|| fallback_email.trim().to_string()),
                    display_name: identity.display_name,
                };
                self.users.upsert_user(&user)?;
                self.current.send_replace(Some(user));
                info!(
                    "event=auth_sign_in module=auth status=ok method={}",
                    flow.as_str()
                );
                Ok(AuthOutcome::success())
            }
            Err(err) => {
                warn!(
                    "event=auth_sign_in module=auth status=error method={}",
                    flow.as_str()
                );
                Ok(AuthOutcome::failure(err.to_string()))
            }
        }
    }
}

/// Maps provider sign-up failure text to the message shown to the user.
pub fn friendly_sign_up_message(provider_message: Option<&str>) -> String {
    match provider_message {
        Some(text) if DUPLICATE_EMAIL_RE.is_match(text) => DUPLICATE_EMAIL_MESSAGE.to_string(),
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

/// Local checks run before the provider is contacted.
///
/// Returns the failed outcome to show, or `None` when the input may be sent.
pub fn validate_credentials(email: &str, password: &str) -> Option<AuthOutcome> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Some(AuthOutcome::failure(MISSING_CREDENTIALS_MESSAGE));
    }
    if !EMAIL_RE.is_match(email) {
        return Some(AuthOutcome::failure(INVALID_EMAIL_MESSAGE));
    }
    None
}
