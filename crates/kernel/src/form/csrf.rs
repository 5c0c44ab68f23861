//! CSRF token generation and verification.
//!
//! Tokens are random, single use, and kept in the session with their issue
//! time. Every state-changing form carries one in a hidden field.

use anyhow::{Result, bail};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

/// Hidden form field carrying the token.
pub const CSRF_FIELD: &str = "_token";

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of tokens to store per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IssuedToken {
    token: String,
    issued: i64,
}

impl IssuedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now - self.issued <= TOKEN_VALIDITY_SECS
    }
}

async fn load(session: &Session) -> Vec<IssuedToken> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let issued = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(issued.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = load(session).await;
    tokens.retain(|t| t.is_fresh(issued));
    tokens.push(IssuedToken {
        token: token.clone(),
        issued,
    });

    // Keep only the most recent tokens.
    if tokens.len() > MAX_TOKENS {
        let skip = tokens.len() - MAX_TOKENS;
        tokens.drain(..skip);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify a CSRF token against the session.
///
/// A matching token is consumed, so each token verifies once.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        bail!("empty CSRF token");
    }

    let mut tokens = load(session).await;
    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let found = tokens.iter().position(|t| {
        bool::from(t.token.as_bytes().ct_eq(submitted.as_bytes())) && t.is_fresh(now)
    });

    let Some(index) = found else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|t| t.is_fresh(now));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}

/// Clear all CSRF tokens from the session.
pub async fn clear_csrf_tokens(session: &Session) -> Result<()> {
    session
        .remove::<Vec<IssuedToken>>(CSRF_SESSION_KEY)
        .await
        .map_err(|e| anyhow::anyhow!("failed to clear CSRF tokens: {e}"))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn token_is_hex_sha256() {
        let token = generate_csrf_token(&session()).await.unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn tokens_are_single_use() {
        let session = session();
        let token = generate_csrf_token(&session).await.unwrap();

        assert!(verify_csrf_token(&session, &token).await.unwrap());
        assert!(!verify_csrf_token(&session, &token).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_and_empty_tokens_fail() {
        let session = session();
        generate_csrf_token(&session).await.unwrap();

        assert!(!verify_csrf_token(&session, "deadbeef").await.unwrap());
        assert!(verify_csrf_token(&session, "").await.is_err());
    }

    #[tokio::test]
    async fn only_recent_tokens_are_kept() {
        let session = session();
        let first = generate_csrf_token(&session).await.unwrap();
        for _ in 0..MAX_TOKENS {
            generate_csrf_token(&session).await.unwrap();
        }
        assert!(!verify_csrf_token(&session, &first).await.unwrap());
    }

    #[tokio::test]
    async fn clearing_drops_tokens() {
        let session = session();
        let token = generate_csrf_token(&session).await.unwrap();
        clear_csrf_tokens(&session).await.unwrap();
        assert!(!verify_csrf_token(&session, &token).await.unwrap());
    }
}
