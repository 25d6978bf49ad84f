//! Core types for tweet-relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Handle (screen name) without the leading `@`
    pub handle: String,

    /// Display name shown alongside the handle
    pub display_name: String,

    /// Avatar image URL (if the upstream provided one)
    pub avatar_url: Option<String>,
}

/// A single post from the watched account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique post id
    pub id: String,

    /// Post text
    pub text: String,

    /// Who wrote the post
    pub author: Author,

    /// When the post was created (None if the upstream timestamp was absent
    /// or unparseable)
    pub created_at: Option<DateTime<Utc>>,

    /// First attached image URL, if any
    pub media_url: Option<String>,
}

impl Post {
    /// Canonical web URL for this post
    pub fn url(&self) -> String {
        format!(
            "https://twitter.com/{}/status/{}",
            self.author.handle, self.id
        )
    }
}

/// Outcome of a single relay cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The configuration failed validation; nothing was fetched or sent
    ConfigRejected,

    /// First run against an absent ledger: the feed was recorded without
    /// sending any notifications
    Bootstrapped {
        /// Number of post ids written to the ledger
        seeded: usize,
    },

    /// Normal cycle: new posts were delivered oldest-first
    Completed {
        /// Number of posts in the fetched feed
        fetched: usize,
        /// Number of notifications actually sent
        delivered: usize,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, handle: &str) -> Post {
        Post {
            id: id.to_string(),
            text: "hello".to_string(),
            author: Author {
                handle: handle.to_string(),
                display_name: "Example".to_string(),
                avatar_url: None,
            },
            created_at: None,
            media_url: None,
        }
    }

    #[test]
    fn post_url_points_at_the_status_page() {
        assert_eq!(
            post("1234567890", "example").url(),
            "https://twitter.com/example/status/1234567890"
        );
    }

    #[test]
    fn post_serializes_with_snake_case_keys() {
        let json = serde_json::to_value(post("1", "example")).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["author"]["display_name"], "Example");
    }
}
