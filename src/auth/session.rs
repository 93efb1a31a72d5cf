//! Opaque bearer-token sessions and password hashing.
//!
//! Tokens are 32 random bytes, hex encoded, held server-side in a
//! concurrent map with an expiry. Nothing is persisted; restarting the
//! server logs everyone out.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Sessions live this long after issue.
const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// token -> session entry.
pub type SessionMap = Arc<DashMap<String, SessionEntry>>;

pub fn new_session_map() -> SessionMap {
    Arc::new(DashMap::new())
}

/// Issue a fresh token for a user.
pub fn issue_session(sessions: &SessionMap, user_id: i64) -> String {
    let bytes: [u8; 32] = rand::rng().random();
    let token = hex::encode(bytes);
    sessions.insert(
        token.clone(),
        SessionEntry {
            user_id,
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
        },
    );
    token
}

/// Resolve a token to its user id. Expired entries are reaped on touch.
pub fn resolve_session(sessions: &SessionMap, token: &str) -> Option<i64> {
    let entry = sessions.get(token)?;
    if entry.expires_at <= Utc::now() {
        drop(entry);
        sessions.remove(token);
        return None;
    }
    Some(entry.user_id)
}

/// Drop a token. Unknown tokens are a no-op.
pub fn revoke_session(sessions: &SessionMap, token: &str) {
    sessions.remove(token);
}

/// Salted SHA-256 digest, stored as `salt_hex$hash_hex`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::rng().random();
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check a password against a stored digest. A malformed digest never
/// verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    hex::encode(salted_digest(&salt, password)) == hash_hex
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
