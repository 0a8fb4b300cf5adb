use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-wide set of tokens that are currently logged in
///
/// A token must be present here in addition to passing signature and
/// expiry checks. Logout and user deletion revoke membership at once.
#[derive(Debug, Default)]
pub struct ActiveTokenRegistry {
    tokens: RwLock<HashSet<String>>,
}

impl ActiveTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, token: String) {
        self.tokens.write().await.insert(token);
    }

    /// Returns whether the token was present; absence is not an error
    pub async fn remove(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token)
    }

    pub async fn contains(&self, token: &str) -> bool {
        self.tokens.read().await.contains(token)
    }

    /// Removes every token the predicate selects, returning how many went
    pub async fn remove_all<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|token| !predicate(token));
        let removed = before - tokens.len();

        debug!(removed, remaining = tokens.len(), "Purged active tokens");
        removed
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}
