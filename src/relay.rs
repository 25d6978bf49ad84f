//! The fetch-compare-notify cycle
//!
//! One [`Relay::run_once`] call performs a complete cycle: validate the
//! configuration, acquire a session, fetch the watched account's recent
//! posts, and either seed the ledger (first run) or deliver every unseen
//! post oldest-first, recording each delivery before moving on. A delivery
//! failure stops the loop; everything already recorded stays recorded, so
//! the next run resumes where this one stopped.

use crate::config::{Config, RetryConfig, StoragePaths};
use crate::cookie_cache::CookieCache;
use crate::discord::{Notifier, post_message};
use crate::error::{Error, Result};
use crate::notified::Notified;
use crate::retry::with_retry;
use crate::session::acquire_session;
use crate::twitter::TwitterClient;
use crate::types::{Post, RunOutcome};
use std::time::Duration;

/// How many recent posts to fetch per cycle
pub const FEED_PAGE_SIZE: u32 = 200;

/// Pause between consecutive deliveries
const DELIVERY_INTERVAL: Duration = Duration::from_secs(1);

/// One configured relay cycle
pub struct Relay {
    config: Config,
    paths: StoragePaths,
    delivery_interval: Duration,
}

impl Relay {
    /// Create a relay over the given configuration and state-file locations
    pub fn new(config: Config, paths: StoragePaths) -> Self {
        Self {
            config,
            paths,
            delivery_interval: DELIVERY_INTERVAL,
        }
    }

    /// Override the pause between deliveries
    pub fn with_delivery_interval(mut self, interval: Duration) -> Self {
        self.delivery_interval = interval;
        self
    }

    /// Run a single fetch-compare-notify cycle
    ///
    /// # Errors
    ///
    /// Any failure past configuration validation surfaces as an error:
    /// session acquisition, fetching, a malformed ledger, or a rejected
    /// delivery. An invalid configuration is not an error: it yields
    /// [`RunOutcome::ConfigRejected`] without any network activity.
    pub async fn run_once(
        &self,
        client: &dyn TwitterClient,
        notifier: &dyn Notifier,
    ) -> Result<RunOutcome> {
        let violations = self.config.validate();
        if !violations.is_empty() {
            for violation in &violations {
                tracing::error!(violation = %violation, "Invalid configuration");
            }
            return Ok(RunOutcome::ConfigRejected);
        }

        let cache = CookieCache::new(&self.paths.cookie_cache);
        let tokens = acquire_session(client, &cache, &self.config.account).await?;

        let handle = self.config.target_handle().ok_or_else(|| {
            Error::config("no target handle could be resolved", "account.targetHandle")
        })?;
        tracing::info!(handle = %handle, "Fetching recent posts");

        let fetch_retry = RetryConfig::fetch();
        let user = with_retry(&fetch_retry, "user lookup", || {
            client.user_by_handle(&tokens, &handle)
        })
        .await?;
        let user_id = user
            .id_str
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Upstream(format!("user {handle} has no id")))?;
        let fallback_author = user.to_author(&handle);

        let feed = with_retry(&fetch_retry, "timeline fetch", || {
            client.user_posts(&tokens, &user_id, FEED_PAGE_SIZE)
        })
        .await?;
        tracing::info!(count = feed.len(), "Fetched timeline");

        let mut ledger = Notified::new(&self.paths.notified)?;

        // Feed arrives newest-first; notify oldest-first to keep channel order
        let posts: Vec<Post> = feed
            .iter()
            .rev()
            .filter_map(|item| item.normalize(&fallback_author))
            .collect();

        if ledger.is_first_run() {
            for post in &posts {
                ledger.add_without_save(&post.id);
            }
            ledger.save()?;
            tracing::info!(
                seeded = posts.len(),
                "First run: ledger seeded, no notifications sent"
            );
            return Ok(RunOutcome::Bootstrapped { seeded: posts.len() });
        }

        let mut delivered = 0;
        for post in &posts {
            if ledger.is_notified(&post.id) || post.text.is_empty() {
                continue;
            }

            tracing::info!(id = %post.id, "Sending notification");
            notifier.send_message(&post_message(post)).await?;
            ledger.add(&post.id)?;
            delivered += 1;

            tokio::time::sleep(self.delivery_interval).await;
        }

        tracing::info!(
            fetched = posts.len(),
            delivered = delivered,
            "Cycle complete"
        );
        Ok(RunOutcome::Completed {
            fetched: posts.len(),
            delivered,
        })
    }
}
