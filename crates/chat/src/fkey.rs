//! Anti-forgery token shared by every state-changing request.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, Secret};

/// Opaque `fkey` supplied and refreshed by the session layer.
///
/// Clones share the same value, so a refresh is seen by every client.
#[derive(Clone)]
pub struct FKey {
    inner: Arc<RwLock<Secret<String>>>,
}

impl FKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Secret::new(value.into()))),
        }
    }

    /// Replace the token after the session layer re-authenticates.
    pub fn set(&self, value: impl Into<String>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Secret::new(value.into());
    }

    /// Current token value, for building a request body.
    #[must_use]
    pub fn expose(&self) -> String {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.expose_secret().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for FKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FKey([REDACTED])")
    }
}
