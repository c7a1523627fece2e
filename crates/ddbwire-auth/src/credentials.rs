//! Credentials and the sources that produce them.
//!
//! A [`CredentialSource`] answers three questions: what is the current key,
//! can its cached key be dropped, and will it never produce a key at all.
//! [`ChainCredentials`] tries sources in order and sticks with the first one
//! that produces a key.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::AuthError;

/// Environment variable holding the access key ID.
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding the optional session token.
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// A signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key ID, sent in clear in the `Authorization` header.
    pub access_key_id: String,
    /// Secret access key, only ever used to derive signing keys.
    pub secret_access_key: String,
    /// Session token of temporary credentials.
    pub session_token: Option<String>,
    /// When temporary credentials stop being valid.
    pub expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Long-lived credentials without a token or expiry.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expiration: None,
        }
    }

    /// Attach a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attach an expiry instant.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Whether the key expires before `now + window`. Keys without an expiry
    /// never do.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.expiration.is_some_and(|exp| exp <= now + window)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// A place credentials can come from.
#[async_trait]
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// Resolve the current key. `Ok(None)` means this source has nothing to
    /// offer; an error means it tried and failed.
    async fn get_key(&self) -> Result<Option<Credentials>, AuthError>;

    /// Drop any cached key so the next [`get_key`](Self::get_key) resolves
    /// afresh. Returns whether anything was dropped.
    fn invalidate(&self) -> bool;

    /// Whether this source can never produce a key.
    fn is_disabled(&self) -> bool;
}

#[async_trait]
impl<T: CredentialSource + ?Sized> CredentialSource for Arc<T> {
    async fn get_key(&self) -> Result<Option<Credentials>, AuthError> {
        (**self).get_key().await
    }

    fn invalidate(&self) -> bool {
        (**self).invalidate()
    }

    fn is_disabled(&self) -> bool {
        (**self).is_disabled()
    }
}

/// A fixed key supplied by the caller.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    key: Option<Credentials>,
}

impl StaticCredentials {
    /// Always hands out `key`.
    #[must_use]
    pub fn new(key: Credentials) -> Self {
        Self { key: Some(key) }
    }

    /// A source with no key; it is never disabled, it just finds nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { key: None }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn get_key(&self) -> Result<Option<Credentials>, AuthError> {
        Ok(self.key.clone())
    }

    fn invalidate(&self) -> bool {
        false
    }

    fn is_disabled(&self) -> bool {
        false
    }
}

/// Key read from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` /
/// `AWS_SESSION_TOKEN`, captured once at construction.
#[derive(Debug, Clone)]
pub struct EnvironmentCredentials {
    key: Option<Credentials>,
}

impl EnvironmentCredentials {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read variables through `lookup`, which returns `None` for unset names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let key = match (lookup(ENV_ACCESS_KEY_ID), lookup(ENV_SECRET_ACCESS_KEY)) {
            (Some(id), Some(secret)) => {
                let mut key = Credentials::new(id, secret);
                key.session_token = lookup(ENV_SESSION_TOKEN).filter(|t| !t.is_empty());
                Some(key)
            }
            _ => None,
        };
        Self { key }
    }
}

#[async_trait]
impl CredentialSource for EnvironmentCredentials {
    async fn get_key(&self) -> Result<Option<Credentials>, AuthError> {
        Ok(self.key.clone())
    }

    fn invalidate(&self) -> bool {
        false
    }

    fn is_disabled(&self) -> bool {
        self.key.is_none()
    }
}

/// Tries each source in order and returns the first key found.
///
/// Disabled sources are dropped at construction. A source that fails is
/// logged and skipped. Once a source produces a key, later calls go straight
/// to it.
#[derive(Debug)]
pub struct ChainCredentials {
    candidates: Vec<Box<dyn CredentialSource>>,
    chosen: Mutex<Option<usize>>,
}

impl ChainCredentials {
    /// Build a chain from sources in priority order.
    #[must_use]
    pub fn new(candidates: Vec<Box<dyn CredentialSource>>) -> Self {
        let candidates = candidates
            .into_iter()
            .filter(|candidate| {
                let disabled = candidate.is_disabled();
                if disabled {
                    debug!(?candidate, "skipping disabled credential source");
                }
                !disabled
            })
            .collect();
        Self {
            candidates,
            chosen: Mutex::new(None),
        }
    }

    /// The default chain: environment variables only. File and metadata
    /// sources plug in through [`ChainCredentials::new`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(vec![Box::new(EnvironmentCredentials::from_env())])
    }
}

#[async_trait]
impl CredentialSource for ChainCredentials {
    async fn get_key(&self) -> Result<Option<Credentials>, AuthError> {
        let chosen = *self.chosen.lock();
        if let Some(index) = chosen {
            return self.candidates[index].get_key().await;
        }

        for (index, candidate) in self.candidates.iter().enumerate() {
            match candidate.get_key().await {
                Ok(Some(key)) => {
                    debug!(?candidate, access_key_id = %key.access_key_id, "credential source found a key");
                    *self.chosen.lock() = Some(index);
                    return Ok(Some(key));
                }
                Ok(None) => debug!(?candidate, "credential source found no key"),
                Err(e) => warn!(?candidate, error = %e, "credential source failed"),
            }
        }
        Ok(None)
    }

    fn invalidate(&self) -> bool {
        self.candidates
            .iter()
            .fold(false, |dropped, candidate| candidate.invalidate() || dropped)
    }

    fn is_disabled(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    /// A source that counts calls and answers from a script.
    #[derive(Debug)]
    pub(crate) struct ScriptedSource {
        pub(crate) name: &'static str,
        pub(crate) answer: Result<Option<Credentials>, &'static str>,
        pub(crate) disabled: bool,
        pub(crate) calls: AtomicUsize,
        pub(crate) invalidated: AtomicBool,
    }

    impl ScriptedSource {
        pub(crate) fn new(name: &'static str, answer: Result<Option<Credentials>, &'static str>) -> Self {
            Self {
                name,
                answer,
                disabled: false,
                calls: AtomicUsize::new(0),
                invalidated: AtomicBool::new(false),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialSource for ScriptedSource {
        async fn get_key(&self) -> Result<Option<Credentials>, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().map_err(|message| AuthError::Source {
                source_name: self.name.to_owned(),
                message: message.to_owned(),
            })
        }

        fn invalidate(&self) -> bool {
            self.invalidated.store(true, Ordering::SeqCst);
            true
        }

        fn is_disabled(&self) -> bool {
            self.disabled
        }
    }

    #[test]
    fn test_should_redact_secrets_in_debug() {
        let key = Credentials::new("AKID", "very-secret").with_session_token("tok");
        let debug = format!("{key:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("tok\""));
    }

    #[test]
    fn test_should_detect_expiry_window() {
        let now = Utc::now();
        let key = Credentials::new("a", "b").with_expiration(now + chrono::Duration::minutes(5));
        assert!(key.expires_within(now, chrono::Duration::minutes(10)));
        assert!(!key.expires_within(now, chrono::Duration::minutes(1)));
        assert!(!Credentials::new("a", "b").expires_within(now, chrono::Duration::days(365)));
    }

    #[tokio::test]
    async fn test_should_read_environment_variables() {
        let vars = HashMap::from([
            (ENV_ACCESS_KEY_ID, "AKID"),
            (ENV_SECRET_ACCESS_KEY, "secret"),
            (ENV_SESSION_TOKEN, "token"),
        ]);
        let source =
            EnvironmentCredentials::from_lookup(|name| vars.get(name).map(|v| (*v).to_owned()));
        assert!(!source.is_disabled());
        let key = source.get_key().await.unwrap().unwrap();
        assert_eq!(key.access_key_id, "AKID");
        assert_eq!(key.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_should_disable_environment_without_secret() {
        let source = EnvironmentCredentials::from_lookup(|name| {
            (name == ENV_ACCESS_KEY_ID).then(|| "AKID".to_owned())
        });
        assert!(source.is_disabled());
    }

    #[tokio::test]
    async fn test_should_short_circuit_chain_on_first_success() {
        let mut disabled = ScriptedSource::new("disabled", Ok(None));
        disabled.disabled = true;
        let disabled = Arc::new(disabled);
        let failing = Arc::new(ScriptedSource::new("failing", Err("boom")));
        let first = Arc::new(ScriptedSource::new(
            "first",
            Ok(Some(Credentials::new("FIRST", "s1"))),
        ));
        let second = Arc::new(ScriptedSource::new(
            "second",
            Ok(Some(Credentials::new("SECOND", "s2"))),
        ));

        let chain = ChainCredentials::new(vec![
            Box::new(Arc::clone(&disabled)),
            Box::new(Arc::clone(&failing)),
            Box::new(Arc::clone(&first)),
            Box::new(Arc::clone(&second)),
        ]);

        let key = chain.get_key().await.unwrap().unwrap();
        assert_eq!(key.access_key_id, "FIRST");
        assert_eq!(disabled.calls(), 0);
        assert_eq!(failing.calls(), 1);
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);

        // The chosen source is reused without retrying earlier ones.
        let again = chain.get_key().await.unwrap().unwrap();
        assert_eq!(again.access_key_id, "FIRST");
        assert_eq!(failing.calls(), 1);
        assert_eq!(first.calls(), 2);
    }

    #[tokio::test]
    async fn test_should_return_none_when_chain_exhausted() {
        let chain = ChainCredentials::new(vec![
            Box::new(StaticCredentials::empty()),
            Box::new(ScriptedSource::new("failing", Err("boom"))),
        ]);
        assert!(chain.get_key().await.unwrap().is_none());
    }

    #[test]
    fn test_should_report_disabled_when_every_source_is_disabled() {
        let chain = ChainCredentials::new(vec![Box::new(EnvironmentCredentials::from_lookup(
            |_| None,
        ))]);
        assert!(chain.is_disabled());
    }

    #[test]
    fn test_should_invalidate_every_candidate() {
        let a = Arc::new(ScriptedSource::new("a", Ok(None)));
        let b = Arc::new(ScriptedSource::new("b", Ok(None)));
        let chain = ChainCredentials::new(vec![Box::new(Arc::clone(&a)), Box::new(Arc::clone(&b))]);
        assert!(chain.invalidate());
        assert!(a.invalidated.load(Ordering::SeqCst));
        assert!(b.invalidated.load(Ordering::SeqCst));
    }
}
