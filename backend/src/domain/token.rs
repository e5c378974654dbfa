//! Opaque bearer access tokens.
//!
//! A token is 32 random bytes, hex-encoded on the wire. The server never
//! stores the token itself; it stores the SHA-256 fingerprint alongside the
//! owning user and an expiry, so a leaked token table cannot be replayed.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use super::user::UserId;

/// Number of random bytes behind each token (64 hex characters on the wire).
pub const TOKEN_BYTES: usize = 32;

/// Default token lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 14;

/// Errors produced when parsing a presented bearer token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessTokenError {
    /// Token was empty or the wrong length.
    #[error("access token must be {expected} hex characters", expected = TOKEN_BYTES * 2)]
    WrongLength,
    /// Token contained non-hexadecimal characters.
    #[error("access token must be hex-encoded")]
    NotHex,
}

/// A bearer token as presented on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a token presented in an `Authorization: Bearer` header.
    pub fn parse(raw: &str) -> Result<Self, AccessTokenError> {
        if raw.len() != TOKEN_BYTES * 2 {
            return Err(AccessTokenError::WrongLength);
        }
        if !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AccessTokenError::NotHex);
        }
        Ok(Self(raw.to_lowercase()))
    }

    /// The wire representation handed to the client exactly once.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// SHA-256 fingerprint stored server-side in place of the token.
    #[must_use]
    pub fn fingerprint(&self) -> TokenFingerprint {
        let digest = Sha256::digest(self.0.as_bytes());
        TokenFingerprint(hex::encode(digest))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Hex-encoded SHA-256 fingerprint of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenFingerprint(String);

impl TokenFingerprint {
    /// Borrow the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Reconstruct a fingerprint loaded from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for TokenFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side record of an issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Fingerprint keyed in storage.
    pub fingerprint: TokenFingerprint,
    /// Owning user.
    pub user_id: UserId,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Record a freshly issued token with a lifetime of `ttl_hours`.
    #[must_use]
    pub fn issue(
        token: &AccessToken,
        user_id: UserId,
        now: DateTime<Utc>,
        ttl_hours: i64,
    ) -> Self {
        Self {
            fingerprint: token.fingerprint(),
            user_id,
            expires_at: now + chrono::Duration::hours(ttl_hours),
            issued_at: now,
        }
    }

    /// Whether the token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn generated_tokens_are_unique_hex() {
        let a = AccessToken::generate();
        let b = AccessToken::generate();
        assert_ne!(a.expose(), b.expose());
        assert_eq!(a.expose().len(), TOKEN_BYTES * 2);
        assert!(a.expose().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[rstest]
    #[case("short", AccessTokenError::WrongLength)]
    #[case(
        "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
        AccessTokenError::NotHex
    )]
    fn malformed_tokens_are_rejected(#[case] raw: &str, #[case] expected: AccessTokenError) {
        assert_eq!(AccessToken::parse(raw), Err(expected));
    }

    #[rstest]
    fn parse_round_trips_generated_tokens() {
        let token = AccessToken::generate();
        let parsed = AccessToken::parse(token.expose()).expect("own tokens parse");
        assert_eq!(parsed.fingerprint(), token.fingerprint());
    }

    #[rstest]
    fn fingerprint_differs_from_token() {
        let token = AccessToken::generate();
        assert_ne!(token.fingerprint().as_str(), token.expose());
    }

    #[rstest]
    fn records_expire_after_ttl() {
        let token = AccessToken::generate();
        let now = Utc::now();
        let record = TokenRecord::issue(&token, UserId::random(), now, 1);
        assert!(!record.is_expired(now));
        assert!(record.is_expired(now + chrono::Duration::hours(2)));
    }
}
