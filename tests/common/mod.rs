//! Shared helpers for the end-to-end relay tests

use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;
use tweet_relay::config::{AccountConfig, Config, DiscordConfig, StoragePaths};
use tweet_relay::cookie_cache::{CookieCache, SessionTokens};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Handle of the watched account used throughout the suite
pub const HANDLE: &str = "watched";

/// User id the mock upstream reports for [`HANDLE`]
pub const USER_ID: &str = "42";

/// Configuration pointing Discord delivery at the given webhook URL
pub fn webhook_config(webhook_url: &str) -> Config {
    Config {
        account: AccountConfig {
            username: Some("watcher".to_string()),
            password: Some("hunter2".to_string()),
            target_handle: Some(HANDLE.to_string()),
            ..AccountConfig::default()
        },
        discord: DiscordConfig {
            webhook_url: Some(webhook_url.to_string()),
            ..DiscordConfig::default()
        },
    }
}

/// State-file locations inside a per-test temp directory
pub fn storage_paths(dir: &TempDir) -> StoragePaths {
    StoragePaths {
        cookie_cache: dir.path().join("cookies.json"),
        notified: dir.path().join("notified.json"),
    }
}

/// Pre-seed the cookie cache so the cycle skips login
pub fn seed_session(dir: &TempDir) {
    CookieCache::new(dir.path().join("cookies.json"))
        .save(&SessionTokens {
            auth_token: "cached-auth".to_string(),
            ct0: "cached-csrf".to_string(),
        })
        .expect("seeding the cookie cache");
}

/// Ids currently persisted in the ledger file
pub fn ledger_ids(dir: &TempDir) -> Vec<String> {
    read_ledger(&dir.path().join("notified.json"))
}

fn read_ledger(path: &Path) -> Vec<String> {
    let raw = std::fs::read_to_string(path).expect("reading the ledger file");
    serde_json::from_str(&raw).expect("parsing the ledger file")
}

/// One timeline item as the upstream serializes it
pub fn feed_item(id: &str, text: &str) -> Value {
    json!({
        "id_str": id,
        "full_text": text,
        "created_at": "Sat Apr 05 16:52:01 +0000 2025",
        "user": {
            "id_str": USER_ID,
            "name": "Watched Account",
            "screen_name": HANDLE,
            "profile_image_url_https": "https://images.example/a.jpg"
        }
    })
}

/// Serve the user-lookup endpoint for [`HANDLE`]
pub async fn mount_user_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", HANDLE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_str": USER_ID,
            "name": "Watched Account",
            "screen_name": HANDLE,
            "profile_image_url_https": "https://images.example/a.jpg"
        })))
        .mount(server)
        .await;
}

/// Serve the timeline endpoint with the given feed, newest first
pub async fn mount_timeline(server: &MockServer, feed: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/1.1/statuses/user_timeline.json"))
        .and(query_param("user_id", USER_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(feed)))
        .mount(server)
        .await;
}
