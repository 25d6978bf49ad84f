//! Upstream Twitter client
//!
//! This module provides a trait-based client for the upstream account API.
//! The core abstraction is the [`TwitterClient`] trait, which covers the
//! interactive login flow, session verification, cookie access, and the two
//! data fetches the relay needs (user lookup and timeline).
//!
//! [`HttpTwitterClient`] is the production implementation, talking to the
//! v1.1 REST endpoints over the shared [`Transport`](crate::transport::Transport).
//! Tests substitute their own implementations of the trait.

mod http;
mod types;

pub use http::HttpTwitterClient;
pub use types::{UpstreamEntities, UpstreamMedia, UpstreamPost, UpstreamUser};

use crate::cookie_cache::SessionTokens;
use crate::error::Result;
use async_trait::async_trait;

/// A single cookie captured from the login session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name
    pub key: String,
    /// Cookie value
    pub value: String,
}

/// Credentials fed into the interactive login flow
#[derive(Clone, Debug)]
pub struct LoginCredentials {
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
    /// Email address, used when the upstream asks for an alternate identifier
    pub email: Option<String>,
    /// One-time-password secret for two-factor challenges, forwarded verbatim
    pub otp_secret: Option<String>,
}

/// Client for the upstream account API
///
/// # Examples
///
/// ```no_run
/// use tweet_relay::transport::{ProxySettings, Transport};
/// use tweet_relay::twitter::{HttpTwitterClient, LoginCredentials, TwitterClient};
///
/// # async fn example() -> tweet_relay::Result<()> {
/// let transport = Transport::new(ProxySettings::default());
/// let client = HttpTwitterClient::new(&transport);
/// client
///     .login(&LoginCredentials {
///         username: "watcher".to_string(),
///         password: "hunter2".to_string(),
///         email: None,
///         otp_secret: None,
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TwitterClient: Send + Sync {
    /// Run the interactive login flow to completion
    ///
    /// # Errors
    ///
    /// Returns an auth error when the upstream denies the login, asks for a
    /// challenge the credentials cannot answer, or the flow does not reach a
    /// terminal state.
    async fn login(&self, credentials: &LoginCredentials) -> Result<()>;

    /// Whether the current session is accepted by the upstream
    async fn is_logged_in(&self) -> Result<bool>;

    /// Snapshot of the cookies collected during login
    async fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Look up a user by handle
    async fn user_by_handle(&self, tokens: &SessionTokens, handle: &str) -> Result<UpstreamUser>;

    /// Fetch the most recent posts for a user id, newest first
    async fn user_posts(
        &self,
        tokens: &SessionTokens,
        user_id: &str,
        count: u32,
    ) -> Result<Vec<UpstreamPost>>;
}
