//! In-process identity provider.
//!
//! Keeps accounts in memory and issues UUID uids. Used by the CLI and by
//! tests in place of a hosted identity service; its error texts follow the
//! wording hosted providers use so message mapping behaves the same.

use crate::service::auth_service::{IdentityProvider, ProviderError, ProviderUser};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 6;
const METHOD_PASSWORD: &str = "password";
const METHOD_FEDERATED: &str = "id_token";

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug, Default)]
struct ProviderState {
    /// Keyed by lowercase email.
    accounts: HashMap<String, Account>,
    federated: HashMap<String, ProviderUser>,
    signed_in: Option<String>,
}

/// Identity provider backed by an in-memory account table.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<ProviderState>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-registers an email/password account.
    pub fn with_account(
        mut self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Self {
        if let Ok(state) = self.state.get_mut() {
            let account = Account {
                uid: new_uid(),
                email: email.to_string(),
                password: password.to_string(),
                display_name: display_name.map(str::to_string),
            };
            state.accounts.insert(email.to_lowercase(), account);
        }
        self
    }

    /// Makes `id_token` resolve to `identity` on federated sign-in.
    pub fn register_id_token(&self, id_token: &str, identity: ProviderUser) {
        if let Ok(mut state) = self.state.lock() {
            state.federated.insert(id_token.to_string(), identity);
        }
    }

    /// Uid of the currently signed-in account, if any.
    pub fn signed_in_uid(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.signed_in.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::new("An internal error has occurred."))
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        let mut state = self.lock()?;
        let account = state.accounts.get(&email.to_lowercase()).cloned().ok_or_else(|| {
            ProviderError::new(
                "There is no user record corresponding to this identifier. The user may have been deleted.",
            )
        })?;
        if account.password != password {
            return Err(ProviderError::new(
                "The password is invalid or the user does not have a password.",
            ));
        }
        state.signed_in = Some(account.uid.clone());
        Ok(to_provider_user(&account))
    }

    fn create_user_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        let mut state = self.lock()?;
        let key = email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(ProviderError::new(
                "The email address is already in use by another account.",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ProviderError::new(format!(
                "The given password is invalid. [ Password should be at least {MIN_PASSWORD_CHARS} characters ]"
            )));
        }
        let account = Account {
            uid: new_uid(),
            email: email.to_string(),
            password: password.to_string(),
            display_name: None,
        };
        let identity = to_provider_user(&account);
        state.signed_in = Some(account.uid.clone());
        state.accounts.insert(key, account);
        Ok(identity)
    }

    fn sign_in_with_id_token(&self, id_token: &str) -> Result<ProviderUser, ProviderError> {
        let mut state = self.lock()?;
        let identity = state.federated.get(id_token).cloned().ok_or_else(|| {
            ProviderError::new("The supplied auth credential is malformed or has expired.")
        })?;
        state.signed_in = Some(identity.uid.clone());
        Ok(identity)
    }

    fn fetch_sign_in_methods(&self, email: &str) -> Result<Vec<String>, ProviderError> {
        let state = self.lock()?;
        let key = email.to_lowercase();
        let mut methods = Vec::new();
        if state.accounts.contains_key(&key) {
            methods.push(METHOD_PASSWORD.to_string());
        }
        let federated = state.federated.values().any(|identity| {
            identity
                .email
                .as_deref()
                .is_some_and(|value| value.to_lowercase() == key)
        });
        if federated {
            methods.push(METHOD_FEDERATED.to_string());
        }
        Ok(methods)
    }

    fn sign_out(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.signed_in = None;
        }
    }
}

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

fn to_provider_user(account: &Account) -> ProviderUser {
    ProviderUser {
        uid: account.uid.clone(),
        email: Some(account.email.clone()),
        display_name: account.display_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryIdentityProvider;
    use crate::service::auth_service::{IdentityProvider, ProviderUser};

    #[test]
    fn create_then_sign_in_returns_same_uid() {
        let provider = InMemoryIdentityProvider::new();
        let created = provider
            .create_user_with_email("ada@example.com", "hunter22")
            .unwrap();
        provider.sign_out();
        let signed_in = provider
            .sign_in_with_email("ADA@example.com", "hunter22")
            .unwrap();
        assert_eq!(created.uid, signed_in.uid);
        assert_eq!(provider.signed_in_uid(), Some(created.uid));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let provider =
            InMemoryIdentityProvider::new().with_account("ada@example.com", "hunter22", None);
        let err = provider
            .sign_in_with_email("ada@example.com", "nope")
            .unwrap_err();
        assert!(err.to_string().contains("password is invalid"));
    }

    #[test]
    fn sign_in_methods_cover_password_and_federated() {
        let provider =
            InMemoryIdentityProvider::new().with_account("ada@example.com", "hunter22", None);
        provider.register_id_token(
            "token-1",
            ProviderUser {
                uid: "fed-1".to_string(),
                email: Some("ada@example.com".to_string()),
                display_name: None,
            },
        );
        let methods = provider.fetch_sign_in_methods("ada@example.com").unwrap();
        assert_eq!(methods, vec!["password".to_string(), "id_token".to_string()]);
        assert!(provider
            .fetch_sign_in_methods("nobody@example.com")
            .unwrap()
            .is_empty());
    }
}
