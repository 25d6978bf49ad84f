//! Discord notification delivery
//!
//! Builds the embed-plus-buttons message for a post and delivers it either
//! through an incoming webhook or as a bot message to a channel. Delivery
//! errors propagate to the caller; unlike fire-and-forget webhooks, a failed
//! notification must stop the cycle so the post is retried next run.

use crate::config::DiscordConfig;
use crate::error::{Error, Result};
use crate::types::Post;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Accent color of the embeds (upstream brand blue)
pub const EMBED_COLOR: u32 = 0x1DA1F2;

/// Footer label on every embed
const FOOTER_TEXT: &str = "Twitter";

/// Footer icon on every embed
const FOOTER_ICON_URL: &str = "https://abs.twimg.com/icons/apple-touch-icon-192x192.png";

/// Bot-mode API origin
const API_BASE: &str = "https://discord.com/api/v10";

/// Per-delivery timeout
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// A Discord message payload
#[derive(Clone, Debug, Serialize)]
pub struct Message {
    /// Embeds carried by the message
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,

    /// Button rows under the message
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

/// A single embed
#[derive(Clone, Debug, Serialize)]
pub struct Embed {
    /// Body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Author line at the top of the embed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,

    /// Large image under the body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,

    /// Footer line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,

    /// RFC 3339 timestamp shown next to the footer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Accent color
    pub color: u32,
}

/// Author line of an embed
#[derive(Clone, Debug, Serialize)]
pub struct EmbedAuthor {
    /// Displayed name
    pub name: String,

    /// Link target of the author line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Avatar shown next to the name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Image attachment of an embed
#[derive(Clone, Debug, Serialize)]
pub struct EmbedImage {
    /// Image URL
    pub url: String,
}

/// Footer of an embed
#[derive(Clone, Debug, Serialize)]
pub struct EmbedFooter {
    /// Footer text
    pub text: String,

    /// Footer icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A row of link buttons (component type 1)
#[derive(Clone, Debug, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<LinkButton>,
}

impl ActionRow {
    /// Wrap buttons into a row
    pub fn new(components: Vec<LinkButton>) -> Self {
        Self {
            kind: 1,
            components,
        }
    }
}

/// A link-style button (component type 2, style 5)
#[derive(Clone, Debug, Serialize)]
pub struct LinkButton {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    emoji: ButtonEmoji,
    url: String,
}

impl LinkButton {
    /// Create a link button with an emoji label
    pub fn new(emoji: &str, url: impl Into<String>) -> Self {
        Self {
            kind: 2,
            style: 5,
            emoji: ButtonEmoji {
                name: emoji.to_string(),
            },
            url: url.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ButtonEmoji {
    name: String,
}

/// Build the notification message for a post
///
/// One embed (text, author line linking to the account page, optional image,
/// branded footer, post timestamp) plus a row of three link buttons: open,
/// retweet intent, like intent.
pub fn post_message(post: &Post) -> Message {
    let embed = Embed {
        description: Some(post.text.clone()),
        author: Some(EmbedAuthor {
            name: post.author.display_name.clone(),
            url: Some(format!("https://twitter.com/{}", post.author.handle)),
            icon_url: post.author.avatar_url.clone(),
        }),
        image: post.media_url.clone().map(|url| EmbedImage { url }),
        footer: Some(EmbedFooter {
            text: FOOTER_TEXT.to_string(),
            icon_url: Some(FOOTER_ICON_URL.to_string()),
        }),
        timestamp: post.created_at.map(|ts| ts.to_rfc3339()),
        color: EMBED_COLOR,
    };

    let buttons = ActionRow::new(vec![
        LinkButton::new("🔗", post.url()),
        LinkButton::new(
            "🔁",
            format!("https://twitter.com/intent/retweet?tweet_id={}", post.id),
        ),
        LinkButton::new(
            "❤️",
            format!("https://twitter.com/intent/like?tweet_id={}", post.id),
        ),
    ]);

    Message {
        embeds: vec![embed],
        components: vec![buttons],
    }
}

/// Sink for notification messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    async fn send_message(&self, message: &Message) -> Result<()>;
}

/// Where a [`DiscordNotifier`] delivers to
#[derive(Clone, Debug)]
enum Destination {
    Webhook {
        url: String,
    },
    Bot {
        token: String,
        channel_id: String,
        api_base: String,
    },
}

/// [`Notifier`] that posts to Discord
pub struct DiscordNotifier {
    destination: Destination,
    http: reqwest::Client,
}

impl DiscordNotifier {
    /// Deliver through an incoming webhook
    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            destination: Destination::Webhook { url: url.into() },
            http: reqwest::Client::new(),
        }
    }

    /// Deliver as a bot message into a channel
    pub fn bot(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            destination: Destination::Bot {
                token: token.into(),
                channel_id: channel_id.into(),
                api_base: API_BASE.to_string(),
            },
            http: reqwest::Client::new(),
        }
    }

    /// Point bot-mode delivery at a different API origin
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        if let Destination::Bot { api_base, .. } = &mut self.destination {
            *api_base = base.into();
        }
        self
    }

    /// Pick the delivery mode from configuration
    ///
    /// A webhook URL wins over bot credentials when both are present.
    pub fn from_config(config: &DiscordConfig) -> Result<Self> {
        if let Some(url) = config.webhook_url.as_deref().filter(|v| !v.is_empty()) {
            return Ok(Self::webhook(url));
        }
        let token = config.token.as_deref().filter(|v| !v.is_empty());
        let channel_id = config.channel_id.as_deref().filter(|v| !v.is_empty());
        if let (Some(token), Some(channel_id)) = (token, channel_id) {
            return Ok(Self::bot(token, channel_id));
        }
        Err(Error::config(
            "discord must set either webhookUrl, or both token and channelId",
            "discord",
        ))
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_message(&self, message: &Message) -> Result<()> {
        let request = match &self.destination {
            Destination::Webhook { url } => self.http.post(url).json(message),
            Destination::Bot {
                token,
                channel_id,
                api_base,
            } => self
                .http
                .post(format!("{api_base}/channels/{channel_id}/messages"))
                .header("authorization", format!("Bot {token}"))
                .json(message),
        };

        let response = request.timeout(SEND_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Discord rejected the message");
            return Err(Error::Delivery(format!(
                "Discord returned {status}: {body}"
            )));
        }

        tracing::debug!("Notification delivered");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;
    use chrono::TimeZone;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn full_post() -> Post {
        Post {
            id: "1908531234567890123".to_string(),
            text: "hello from the feed".to_string(),
            author: Author {
                handle: "example".to_string(),
                display_name: "Example Account".to_string(),
                avatar_url: Some("https://images.example/a.jpg".to_string()),
            },
            created_at: Some(Utc.with_ymd_and_hms(2025, 4, 5, 16, 52, 1).unwrap()),
            media_url: Some("https://images.example/pic1.jpg".to_string()),
        }
    }

    fn bare_post() -> Post {
        Post {
            id: "7".to_string(),
            text: "plain".to_string(),
            author: Author {
                handle: "example".to_string(),
                display_name: "Example Account".to_string(),
                avatar_url: None,
            },
            created_at: None,
            media_url: None,
        }
    }

    #[test]
    fn message_carries_the_full_embed() {
        let json = serde_json::to_value(post_message(&full_post())).unwrap();
        let embed = &json["embeds"][0];

        assert_eq!(embed["description"], "hello from the feed");
        assert_eq!(embed["author"]["name"], "Example Account");
        assert_eq!(embed["author"]["url"], "https://twitter.com/example");
        assert_eq!(embed["author"]["icon_url"], "https://images.example/a.jpg");
        assert_eq!(embed["image"]["url"], "https://images.example/pic1.jpg");
        assert_eq!(embed["footer"]["text"], "Twitter");
        assert_eq!(
            embed["footer"]["icon_url"],
            "https://abs.twimg.com/icons/apple-touch-icon-192x192.png"
        );
        assert_eq!(embed["timestamp"], "2025-04-05T16:52:01+00:00");
        assert_eq!(embed["color"], 0x1DA1F2);
    }

    #[test]
    fn message_carries_the_three_link_buttons() {
        let json = serde_json::to_value(post_message(&full_post())).unwrap();
        let row = &json["components"][0];

        assert_eq!(row["type"], 1);
        let buttons = row["components"].as_array().unwrap();
        assert_eq!(buttons.len(), 3);
        for button in buttons {
            assert_eq!(button["type"], 2);
            assert_eq!(button["style"], 5, "link buttons use style 5");
        }
        assert_eq!(buttons[0]["emoji"]["name"], "🔗");
        assert_eq!(
            buttons[0]["url"],
            "https://twitter.com/example/status/1908531234567890123"
        );
        assert_eq!(buttons[1]["emoji"]["name"], "🔁");
        assert_eq!(
            buttons[1]["url"],
            "https://twitter.com/intent/retweet?tweet_id=1908531234567890123"
        );
        assert_eq!(buttons[2]["emoji"]["name"], "❤️");
        assert_eq!(
            buttons[2]["url"],
            "https://twitter.com/intent/like?tweet_id=1908531234567890123"
        );
    }

    #[test]
    fn optional_embed_parts_are_omitted_not_nulled() {
        let json = serde_json::to_value(post_message(&bare_post())).unwrap();
        let embed = json["embeds"][0].as_object().unwrap();

        assert!(!embed.contains_key("image"));
        assert!(!embed.contains_key("timestamp"));
        assert!(
            !embed["author"].as_object().unwrap().contains_key("icon_url"),
            "missing avatar should not serialize as null"
        );
    }

    #[tokio::test]
    async fn webhook_delivery_posts_the_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/test"))
            .and(body_partial_json(serde_json::json!({
                "embeds": [{ "description": "plain" }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::webhook(format!("{}/hooks/test", server.uri()));
        notifier.send_message(&post_message(&bare_post())).await.unwrap();
    }

    #[tokio::test]
    async fn webhook_rejection_is_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/test"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Unknown Webhook"))
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::webhook(format!("{}/hooks/test", server.uri()));
        let err = notifier
            .send_message(&post_message(&bare_post()))
            .await
            .unwrap_err();

        match err {
            Error::Delivery(msg) => {
                assert!(msg.contains("404"), "got {msg}");
                assert!(msg.contains("Unknown Webhook"), "got {msg}");
            }
            other => panic!("expected Delivery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bot_delivery_targets_the_channel_with_the_bot_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/123456/messages"))
            .and(header("authorization", "Bot bot-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::bot("bot-token", "123456").with_api_base(server.uri());
        notifier.send_message(&post_message(&bare_post())).await.unwrap();
    }

    #[test]
    fn from_config_prefers_the_webhook() {
        let config = DiscordConfig {
            webhook_url: Some("https://discord.example/hook".to_string()),
            token: Some("bot-token".to_string()),
            channel_id: Some("123456".to_string()),
        };
        let notifier = DiscordNotifier::from_config(&config).unwrap();
        assert!(matches!(notifier.destination, Destination::Webhook { .. }));
    }

    #[test]
    fn from_config_falls_back_to_bot_credentials() {
        let config = DiscordConfig {
            webhook_url: None,
            token: Some("bot-token".to_string()),
            channel_id: Some("123456".to_string()),
        };
        let notifier = DiscordNotifier::from_config(&config).unwrap();
        assert!(matches!(notifier.destination, Destination::Bot { .. }));
    }

    #[test]
    fn from_config_rejects_an_incomplete_destination() {
        let missing_channel = DiscordConfig {
            webhook_url: None,
            token: Some("bot-token".to_string()),
            channel_id: None,
        };
        assert!(DiscordNotifier::from_config(&missing_channel).is_err());

        assert!(DiscordNotifier::from_config(&DiscordConfig::default()).is_err());
    }
}
