//! Bearer-token authentication adapter.

use rand::Rng;
use std::collections::HashMap;
use std::sync::RwLock;
use switcher_core::{AuthPort, GameError, PlayerId};
use tracing::{debug, error, instrument, warn};

/// Opaque random tokens mapped to player ids.
#[derive(Debug, Default)]
pub struct TokenAuth {
    tokens: RwLock<HashMap<String, PlayerId>>,
}

impl TokenAuth {
    /// Creates an empty token table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthPort for TokenAuth {
    #[instrument(skip(self))]
    fn issue(&self, player: PlayerId) -> Result<String, GameError> {
        let token = format!("{:032x}", rand::rng().random::<u128>());
        let mut tokens = self.tokens.write().map_err(|_| {
            error!("Token table lock poisoned");
            GameError::LockPoisoned
        })?;
        tokens.insert(token.clone(), player);
        debug!("Token issued");
        Ok(token)
    }

    fn resolve(&self, token: &str) -> Result<PlayerId, GameError> {
        let tokens = self.tokens.read().map_err(|_| {
            error!("Token table lock poisoned");
            GameError::LockPoisoned
        })?;
        tokens.get(token).copied().ok_or_else(|| {
            warn!("Unknown bearer token");
            GameError::InvalidCredentials
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_resolve() {
        let auth = TokenAuth::new();
        let token = auth.issue(PlayerId::from(5)).expect("Issued");
        assert_eq!(token.len(), 32);
        assert_eq!(auth.resolve(&token), Ok(PlayerId::from(5)));
        assert_eq!(auth.resolve("nope"), Err(GameError::InvalidCredentials));
    }

    #[test]
    fn test_tokens_differ() {
        let auth = TokenAuth::new();
        let a = auth.issue(PlayerId::from(1)).expect("Issued");
        let b = auth.issue(PlayerId::from(1)).expect("Issued");
        assert_ne!(a, b);
    }
}
