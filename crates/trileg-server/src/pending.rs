//! Pending request tokens.
//!
//! Between the redirect to the provider and the callback, the request-token
//! secret is the only per-flow state. Entries are consumed once and expire.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How long a user may take to approve the application.
pub(crate) const PENDING_TTL: Duration = Duration::from_secs(600);

struct PendingEntry {
    secret: String,
    created: Instant,
}

impl PendingEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() >= ttl
    }
}

/// Request token → secret store.
pub(crate) struct PendingTokens {
    ttl: Duration,
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl PendingTokens {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Remember the secret for `token`, dropping expired entries.
    pub(crate) fn insert(&self, token: &str, secret: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        entries.insert(
            token.to_owned(),
            PendingEntry {
                secret: secret.to_owned(),
                created: Instant::now(),
            },
        );
    }

    /// Remove and return the secret for `token` unless it has expired.
    pub(crate) fn take(&self, token: &str) -> Option<String> {
        let entry = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)?;
        if entry.is_expired(self.ttl) {
            tracing::debug!("Pending request token expired");
            return None;
        }
        Some(entry.secret)
    }

    /// Forget `token` without returning its secret.
    pub(crate) fn remove(&self, token: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for PendingTokens {
    fn default() -> Self {
        Self::new(PENDING_TTL)
    }
}
