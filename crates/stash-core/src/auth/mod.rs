//! Per-platform credential holding and OAuth token refresh.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::Result;

/// One consistent view of a platform's credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Remote account the listing belongs to (user id or username)
    #[serde(default)]
    pub account_id: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            account_id: account_id.into(),
        }
    }

    /// A sync can only run with both a refresh token and an account id.
    ///
    /// A blank access token is fine: the first request fails with 401 and
    /// triggers a refresh.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.refresh_token.trim().is_empty() && !self.account_id.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Tokens returned by an OAuth refresh grant
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    /// `None` when the provider did not rotate the refresh token
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Exchanges a refresh token for fresh tokens
pub trait TokenRefresher: Send + Sync + 'static {
    fn refresh_tokens(&self, refresh_token: &str)
        -> impl Future<Output = Result<TokenPair>> + Send;
}

/// Durable backing for a credential store (OS keychain in the CLI)
pub trait CredentialPersistence: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>>;
    fn save(&self, credentials: &Credentials) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Observable credential holder for one platform
///
/// Values live in a `watch` channel so every update replaces all three
/// fields at once and readers never see a half-written set.
pub struct CredentialStore<R> {
    values: watch::Sender<Credentials>,
    refresher: R,
    persistence: Option<Box<dyn CredentialPersistence>>,
}

impl<R: TokenRefresher> CredentialStore<R> {
    /// Create an in-memory store seeded with `initial`
    pub fn new(refresher: R, initial: Credentials) -> Self {
        let (values, _) = watch::channel(initial);
        Self {
            values,
            refresher,
            persistence: None,
        }
    }

    /// Create a store that loads from and writes through to `persistence`
    pub fn with_persistence(
        refresher: R,
        persistence: impl CredentialPersistence + 'static,
    ) -> Result<Self> {
        let initial = persistence.load()?.unwrap_or_default();
        let (values, _) = watch::channel(initial);
        Ok(Self {
            values,
            refresher,
            persistence: Some(Box::new(persistence)),
        })
    }

    /// Current credentials, read as a single value
    pub fn snapshot(&self) -> Credentials {
        self.values.borrow().clone()
    }

    /// Observe credential changes
    pub fn subscribe(&self) -> watch::Receiver<Credentials> {
        self.values.subscribe()
    }

    /// Replace every field
    pub fn set_all(&self, credentials: Credentials) -> Result<()> {
        self.values.send_replace(credentials);
        self.persist()
    }

    /// Replace both tokens in one update, keeping the account id
    pub fn set_access_and_refresh(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<()> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        self.values.send_modify(|credentials| {
            credentials.access_token = access_token;
            credentials.refresh_token = refresh_token;
        });
        self.persist()
    }

    /// Forget everything, including the persisted copy
    pub fn clear(&self) -> Result<()> {
        self.values.send_replace(Credentials::default());
        match &self.persistence {
            Some(persistence) => persistence.clear(),
            None => Ok(()),
        }
    }

    /// Run the refresh grant once. Returns true when new tokens were stored.
    pub async fn refresh(&self, refresh_token: &str) -> bool {
        if refresh_token.trim().is_empty() {
            tracing::warn!("Cannot refresh credentials without a refresh token");
            return false;
        }

        let tokens = match self.refresher.refresh_tokens(refresh_token).await {
            Ok(tokens) => tokens,
            Err(error) => {
                tracing::warn!("Token refresh failed: {}", error);
                return false;
            }
        };

        let refresh_token = tokens
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string());
        if let Err(error) = self.set_access_and_refresh(tokens.access_token, refresh_token) {
            // In-memory values are already updated; the next start may need a re-login.
            tracing::warn!("Refreshed tokens could not be persisted: {}", error);
        }
        true
    }

    fn persist(&self) -> Result<()> {
        match &self.persistence {
            Some(persistence) => persistence.save(&self.values.borrow()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::Error;

    /// Refresher returning a canned result and counting calls
    #[derive(Clone, Default)]
    pub struct FakeRefresher {
        pub calls: Arc<AtomicUsize>,
        pub rotate_to: Option<String>,
        pub fail: bool,
    }

    impl TokenRefresher for FakeRefresher {
        async fn refresh_tokens(&self, _refresh_token: &str) -> Result<TokenPair> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Api("invalid_grant (400)".to_string()));
            }
            Ok(TokenPair {
                access_token: "fresh-access".to_string(),
                refresh_token: self.rotate_to.clone(),
            })
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemoryPersistence {
        pub saved: Arc<Mutex<HashMap<&'static str, Credentials>>>,
    }

    impl CredentialPersistence for InMemoryPersistence {
        fn load(&self) -> Result<Option<Credentials>> {
            Ok(self.saved.lock().unwrap().get("credentials").cloned())
        }

        fn save(&self, credentials: &Credentials) -> Result<()> {
            self.saved
                .lock()
                .unwrap()
                .insert("credentials", credentials.clone());
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            self.saved.lock().unwrap().clear();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::testing::{FakeRefresher, InMemoryPersistence};
    use super::*;

    #[test]
    fn authenticated_requires_refresh_token_and_account() {
        assert!(Credentials::new("", "r1", "u1").is_authenticated());
        assert!(!Credentials::new("abc", " ", "u1").is_authenticated());
        assert!(!Credentials::new("abc", "r1", "").is_authenticated());
    }

    #[test]
    fn credentials_debug_redacts_tokens() {
        let credentials = Credentials::new("secret-access", "secret-refresh", "u1");
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("u1"));
    }

    #[test]
    fn set_access_and_refresh_keeps_account() {
        let store = CredentialStore::new(
            FakeRefresher::default(),
            Credentials::new("a", "r", "u1"),
        );
        let mut receiver = store.subscribe();

        store.set_access_and_refresh("a2", "r2").unwrap();

        assert!(receiver.has_changed().unwrap());
        assert_eq!(
            *receiver.borrow_and_update(),
            Credentials::new("a2", "r2", "u1")
        );
    }

    #[test]
    fn persistence_is_loaded_and_written_through() {
        let persistence = InMemoryPersistence::default();
        persistence
            .save(&Credentials::new("a", "r", "u1"))
            .unwrap();

        let store =
            CredentialStore::with_persistence(FakeRefresher::default(), persistence.clone())
                .unwrap();
        assert_eq!(store.snapshot(), Credentials::new("a", "r", "u1"));

        store.set_access_and_refresh("a2", "r2").unwrap();
        assert_eq!(
            persistence.load().unwrap(),
            Some(Credentials::new("a2", "r2", "u1"))
        );

        store.clear().unwrap();
        assert_eq!(persistence.load().unwrap(), None);
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_keeps_old_refresh_token_when_not_rotated() {
        let refresher = FakeRefresher::default();
        let store = CredentialStore::new(refresher.clone(), Credentials::new("old", "r1", "u1"));

        assert!(store.refresh("r1").await);
        assert_eq!(store.snapshot(), Credentials::new("fresh-access", "r1", "u1"));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_stores_rotated_refresh_token() {
        let refresher = FakeRefresher {
            rotate_to: Some("r2".to_string()),
            ..FakeRefresher::default()
        };
        let store = CredentialStore::new(refresher, Credentials::new("old", "r1", "u1"));

        assert!(store.refresh("r1").await);
        assert_eq!(store.snapshot().refresh_token, "r2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_refresh_leaves_credentials_untouched() {
        let refresher = FakeRefresher {
            fail: true,
            ..FakeRefresher::default()
        };
        let store = CredentialStore::new(refresher, Credentials::new("old", "r1", "u1"));

        assert!(!store.refresh("r1").await);
        assert!(!store.refresh("  ").await);
        assert_eq!(store.snapshot(), Credentials::new("old", "r1", "u1"));
    }
}
