//! Password reset tokens and the grants stored against users.
//!
//! Only the SHA-256 digest of a token is persisted; the plaintext token
//! travels in the emailed link alone.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// Minutes a reset grant stays valid after issue.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Plaintext reset token: 32 random bytes, lower-case hex encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken(String);

impl ResetToken {
    /// Generate a fresh token from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accept a token received from a client, rejecting anything that could
    /// not have been generated here.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == TOKEN_BYTES * 2
            && raw.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Digest persisted in place of the token.
    pub fn digest(&self) -> ResetTokenDigest {
        ResetTokenDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetToken(<redacted>)")
    }
}

/// Hex-encoded SHA-256 digest of a [`ResetToken`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResetTokenDigest(String);

impl ResetTokenDigest {
    /// Rehydrate a stored digest.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Constant-time comparison.
    pub fn matches(&self, other: &ResetTokenDigest) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

/// Outstanding reset grant: token digest plus expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetGrant {
    digest: ResetTokenDigest,
    expires_at: DateTime<Utc>,
}

impl ResetGrant {
    pub fn new(digest: ResetTokenDigest, expires_at: DateTime<Utc>) -> Self {
        Self { digest, expires_at }
    }

    /// Grant for `token` expiring [`RESET_TOKEN_TTL_MINUTES`] after `now`.
    pub fn issue(token: &ResetToken, now: DateTime<Utc>) -> Self {
        Self::new(
            token.digest(),
            now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        )
    }

    pub fn digest(&self) -> &ResetTokenDigest {
        &self.digest
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether `digest` redeems this grant at `now`.
    pub fn accepts(&self, digest: &ResetTokenDigest, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now) && self.digest.matches(digest)
    }
}
