//! # tweet-relay
//!
//! Batch relay that watches one Twitter account and announces every new post
//! to a Discord channel. Each invocation runs a single fetch-compare-notify
//! cycle: reuse or establish a session, fetch the account's recent posts,
//! diff them against a local ledger of already-notified ids, deliver one
//! notification per unseen post (oldest first), and exit.
//!
//! The first run against an absent ledger seeds it with the current feed
//! without sending anything, so only posts appearing afterwards are ever
//! announced.
//!
//! ## Quick start
//!
//! ```no_run
//! use tweet_relay::config::{Config, StoragePaths};
//! use tweet_relay::discord::DiscordNotifier;
//! use tweet_relay::relay::Relay;
//! use tweet_relay::transport::{ProxySettings, Transport};
//! use tweet_relay::twitter::HttpTwitterClient;
//!
//! #[tokio::main]
//! async fn main() -> tweet_relay::Result<()> {
//!     let config = Config::load("./data/config.json")?;
//!     let notifier = DiscordNotifier::from_config(&config.discord)?;
//!
//!     let mut transport = Transport::new(ProxySettings::from_env()?);
//!     let client = HttpTwitterClient::new(&transport);
//!
//!     let relay = Relay::new(config, StoragePaths::from_env());
//!     let outcome = relay.run_once(&client, &notifier).await;
//!
//!     drop(client);
//!     transport.close();
//!
//!     outcome.map(|_| ())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// On-disk cache for session cookies
pub mod cookie_cache;
/// Discord notification delivery
pub mod discord;
/// Error types
pub mod error;
/// Ledger of already-notified post ids
pub mod notified;
/// The fetch-compare-notify cycle
pub mod relay;
/// Retry logic with exponential backoff
pub mod retry;
/// Session acquisition
pub mod session;
/// Shared HTTP transport
pub mod transport;
/// Upstream Twitter client
pub mod twitter;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, RetryConfig, StoragePaths};
pub use cookie_cache::{CookieCache, SessionTokens};
pub use discord::{DiscordNotifier, Notifier};
pub use error::{Error, Result};
pub use notified::Notified;
pub use relay::Relay;
pub use twitter::{HttpTwitterClient, TwitterClient};
pub use types::{Author, Post, RunOutcome};
