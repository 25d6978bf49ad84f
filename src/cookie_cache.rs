//! On-disk cache for session cookies
//!
//! Logging in is the most fragile and rate-limited part of talking to the
//! upstream, so the two session cookies are persisted between invocations.
//! Every failure to produce a usable cached session is a soft miss that falls
//! back to a fresh login; only writing the cache can surface an error.

use crate::error::Result;
use crate::utils::write_atomic;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cached sessions older than this are discarded
pub const COOKIE_EXPIRY_DAYS: i64 = 7;

/// The cookie pair that authenticates API calls
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTokens {
    /// `auth_token` session cookie
    pub auth_token: String,

    /// `ct0` CSRF cookie
    pub ct0: String,
}

/// On-disk shape of the cache file
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    auth_token: String,
    ct0: String,
    #[serde(rename = "savedAt")]
    saved_at: i64,
}

/// Cookie cache at a fixed filesystem path
pub struct CookieCache {
    path: PathBuf,
}

impl CookieCache {
    /// Create a cache handle for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this cache reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cached session cookies, if present and fresh
    ///
    /// Returns `None` when the file is absent, unreadable, malformed, or
    /// older than [`COOKIE_EXPIRY_DAYS`]. None of those cases is an error;
    /// the caller logs in fresh.
    pub fn load(&self) -> Option<SessionTokens> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No cookie cache on disk");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not read cookie cache, logging in fresh"
                );
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cookie cache is malformed, logging in fresh"
                );
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis().saturating_sub(record.saved_at);
        if age_ms > COOKIE_EXPIRY_DAYS * 24 * 60 * 60 * 1000 {
            tracing::debug!(
                age_days = age_ms / (24 * 60 * 60 * 1000),
                "Cached session is too old, logging in fresh"
            );
            return None;
        }

        Some(SessionTokens {
            auth_token: record.auth_token,
            ct0: record.ct0,
        })
    }

    /// Persist session cookies with the current timestamp
    pub fn save(&self, tokens: &SessionTokens) -> Result<()> {
        let record = CacheRecord {
            auth_token: tokens.auth_token.clone(),
            ct0: tokens.ct0.clone(),
            saved_at: Utc::now().timestamp_millis(),
        };
        write_atomic(&self.path, &serde_json::to_string_pretty(&record)?)?;
        tracing::debug!(path = %self.path.display(), "Saved session cookies");
        Ok(())
    }
}
