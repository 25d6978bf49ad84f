//! Wire-format types for the upstream v1.1 API
//!
//! Every field is optional: the upstream omits or renames fields across API
//! versions, and a post the relay cannot fully understand should degrade
//! rather than fail the whole feed. Normalization into the crate's own
//! [`Post`] type happens here.

use crate::types::{Author, Post};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Timestamp format used by the upstream, e.g. `Sat Apr 05 16:52:01 +0000 2025`
pub(crate) const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// User record as returned by the `users/show` endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamUser {
    /// Numeric user id as a string
    #[serde(default)]
    pub id_str: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Handle without the leading `@`
    #[serde(default)]
    pub screen_name: Option<String>,

    /// Avatar image URL
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
}

impl UpstreamUser {
    /// Convert into an [`Author`], filling gaps from the given handle
    pub fn to_author(&self, fallback_handle: &str) -> Author {
        let handle = self
            .screen_name
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback_handle.to_string());
        let display_name = self
            .name
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| handle.clone());
        Author {
            handle,
            display_name,
            avatar_url: self.profile_image_url_https.clone(),
        }
    }
}

/// Media attachment within a post
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamMedia {
    /// Image URL
    #[serde(default)]
    pub media_url_https: Option<String>,
}

/// Media container within a post
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamEntities {
    /// Attached media, in feed order
    #[serde(default)]
    pub media: Vec<UpstreamMedia>,
}

/// Timeline item as returned by the `statuses/user_timeline` endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamPost {
    /// Post id as a string
    #[serde(default)]
    pub id_str: Option<String>,

    /// Alternate id field used by newer API surfaces
    #[serde(default)]
    pub rest_id: Option<String>,

    /// Untruncated text (present with `tweet_mode=extended`)
    #[serde(default)]
    pub full_text: Option<String>,

    /// Possibly-truncated text
    #[serde(default)]
    pub text: Option<String>,

    /// Creation timestamp in [`CREATED_AT_FORMAT`]
    #[serde(default)]
    pub created_at: Option<String>,

    /// Post author as embedded in the timeline item
    #[serde(default)]
    pub user: Option<UpstreamUser>,

    /// Media attachments
    #[serde(default)]
    pub extended_entities: Option<UpstreamEntities>,
}

impl UpstreamPost {
    /// The post id, preferring `id_str` over `rest_id`
    pub fn post_id(&self) -> Option<&str> {
        self.id_str
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| self.rest_id.as_deref().filter(|v| !v.is_empty()))
    }

    /// Normalize into a [`Post`], or `None` when the item has no usable id
    ///
    /// Text prefers `full_text` over `text` and falls back to empty. Author
    /// fields come from the embedded user, with gaps filled from
    /// `fallback_author`. An unparseable timestamp becomes `None` rather
    /// than dropping the post.
    pub fn normalize(&self, fallback_author: &Author) -> Option<Post> {
        let Some(id) = self.post_id() else {
            tracing::debug!("Skipping timeline item with no id");
            return None;
        };

        let text = self
            .full_text
            .clone()
            .or_else(|| self.text.clone())
            .unwrap_or_default();

        let author = match &self.user {
            Some(user) => {
                let merged = user.to_author(&fallback_author.handle);
                Author {
                    avatar_url: merged
                        .avatar_url
                        .or_else(|| fallback_author.avatar_url.clone()),
                    ..merged
                }
            }
            None => fallback_author.clone(),
        };

        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_str(raw, CREATED_AT_FORMAT).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let media_url = self
            .extended_entities
            .as_ref()
            .and_then(|entities| entities.media.first())
            .and_then(|media| media.media_url_https.clone());

        Some(Post {
            id: id.to_string(),
            text,
            author,
            created_at,
            media_url,
        })
    }
}
