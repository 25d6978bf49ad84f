//! HTTP implementation of the upstream client
//!
//! Login follows the public web onboarding flow: activate a guest token,
//! open the login flow, then answer subtasks one at a time until the
//! upstream reports success. Cookies are harvested from every login-path
//! response into a manual jar so the session pair can be extracted after
//! the flow completes.

use super::types::{UpstreamPost, UpstreamUser};
use super::{Cookie, LoginCredentials, TwitterClient};
use crate::cookie_cache::SessionTokens;
use crate::error::{Error, Result};
use crate::transport::{self, Transport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Bearer token of the upstream's own web client, required on every call
const BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Upper bound on login flow rounds before giving up
const MAX_FLOW_STEPS: usize = 16;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Production [`TwitterClient`] over the shared HTTP transport
pub struct HttpTwitterClient<'a> {
    transport: &'a Transport,
    /// Override for the API origin (None means the real upstream)
    base: Option<Url>,
    jar: Mutex<HashMap<String, String>>,
}

impl<'a> HttpTwitterClient<'a> {
    /// Create a client against the real upstream API
    pub fn new(transport: &'a Transport) -> Self {
        Self {
            transport,
            base: None,
            jar: Mutex::new(HashMap::new()),
        }
    }

    /// Point the client at a different API origin
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let url = match &self.base {
            Some(base) => base.join(path),
            None => Url::parse(&format!("{DEFAULT_BASE_URL}{path}")),
        };
        url.map_err(|e| Error::Other(format!("invalid endpoint {path}: {e}")))
    }

    /// Harvest cookies, then reject non-success login-path responses
    async fn accept(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response> {
        self.store_cookies(&response).await;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth(format!("{operation} failed: {status}")));
        }
        Ok(response)
    }

    async fn store_cookies(&self, response: &reqwest::Response) {
        let mut jar = self.jar.lock().await;
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or(raw);
            if let Some((key, val)) = pair.split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    jar.insert(key.to_string(), val.trim().to_string());
                }
            }
        }
    }

    /// Headers derived from the jar, plus the bearer and optional guest token
    async fn jar_headers(&self, guest_token: Option<&str>) -> Result<HeaderMap> {
        let jar = self.jar.lock().await;
        let mut pairs: Vec<(&str, String)> =
            vec![("authorization", format!("Bearer {BEARER_TOKEN}"))];
        if let Some(token) = guest_token {
            pairs.push(("x-guest-token", token.to_string()));
        }
        let cookie_line = jar
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        if !cookie_line.is_empty() {
            pairs.push(("cookie", cookie_line));
        }
        if let Some(ct0) = jar.get("ct0") {
            pairs.push(("x-csrf-token", ct0.clone()));
        }
        drop(jar);
        transport::header_map(&pairs)
    }

    async fn activate_guest_token(&self) -> Result<String> {
        let client = self.transport.handle().await?;
        let response = client
            .post(self.endpoint("/1.1/guest/activate.json")?)
            .header("authorization", format!("Bearer {BEARER_TOKEN}"))
            .send()
            .await?;
        let response = self.accept(response, "guest token activation").await?;
        let body: GuestTokenResponse = response.json().await?;
        Ok(body.guest_token)
    }

    async fn start_login_flow(&self, guest_token: &str) -> Result<FlowResponse> {
        let client = self.transport.handle().await?;
        let response = client
            .post(self.endpoint("/1.1/onboarding/task.json")?)
            .query(&[("flow_name", "login")])
            .headers(self.jar_headers(Some(guest_token)).await?)
            .json(&json!({
                "input_flow_data": {
                    "flow_context": {
                        "debug_overrides": {},
                        "start_location": { "location": "splash_screen" }
                    }
                },
                "subtask_versions": {}
            }))
            .send()
            .await?;
        let response = self.accept(response, "login flow start").await?;
        Ok(response.json().await?)
    }

    async fn advance_login_flow(
        &self,
        guest_token: &str,
        flow_token: &str,
        input: Value,
    ) -> Result<FlowResponse> {
        let client = self.transport.handle().await?;
        let response = client
            .post(self.endpoint("/1.1/onboarding/task.json")?)
            .headers(self.jar_headers(Some(guest_token)).await?)
            .json(&json!({
                "flow_token": flow_token,
                "subtask_inputs": [input]
            }))
            .send()
            .await?;
        let response = self.accept(response, "login flow step").await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TwitterClient for HttpTwitterClient<'_> {
    async fn login(&self, credentials: &LoginCredentials) -> Result<()> {
        let guest_token = self.activate_guest_token().await?;
        let mut flow = self.start_login_flow(&guest_token).await?;

        for _ in 0..MAX_FLOW_STEPS {
            let Some(subtask) = flow.subtasks.first() else {
                return Err(Error::Auth("login flow returned no subtasks".to_string()));
            };
            let subtask_id = subtask.subtask_id.clone();
            tracing::debug!(subtask = %subtask_id, "Handling login subtask");

            let input = match subtask_id.as_str() {
                "LoginSuccessSubtask" => {
                    tracing::info!("Login flow completed");
                    return Ok(());
                }
                "DenyLoginSubtask" => {
                    return Err(Error::Auth("login denied by the upstream".to_string()));
                }
                "LoginJsInstrumentationSubtask" => json!({
                    "subtask_id": subtask_id,
                    "js_instrumentation": { "response": "{}", "link": "next_link" }
                }),
                "LoginEnterUserIdentifierSSO" => json!({
                    "subtask_id": subtask_id,
                    "settings_list": {
                        "setting_responses": [{
                            "key": "user_identifier",
                            "response_data": { "text_data": { "result": credentials.username } }
                        }],
                        "link": "next_link"
                    }
                }),
                "LoginEnterPassword" => json!({
                    "subtask_id": subtask_id,
                    "enter_password": { "password": credentials.password, "link": "next_link" }
                }),
                "LoginEnterAlternateIdentifierSubtask" => {
                    let Some(email) = &credentials.email else {
                        return Err(Error::Auth(
                            "upstream asked for an alternate identifier, but no email address is configured"
                                .to_string(),
                        ));
                    };
                    json!({
                        "subtask_id": subtask_id,
                        "enter_text": { "text": email, "link": "next_link" }
                    })
                }
                "LoginTwoFactorAuthChallenge" => {
                    let Some(otp) = &credentials.otp_secret else {
                        return Err(Error::Auth(
                            "upstream asked for a two-factor code, but no OTP secret is configured"
                                .to_string(),
                        ));
                    };
                    json!({
                        "subtask_id": subtask_id,
                        "enter_text": { "text": otp, "link": "next_link" }
                    })
                }
                other => {
                    return Err(Error::Auth(format!("unsupported login subtask: {other}")));
                }
            };

            flow = self
                .advance_login_flow(&guest_token, &flow.flow_token, input)
                .await?;
        }

        Err(Error::Auth(format!(
            "login flow did not converge after {MAX_FLOW_STEPS} steps"
        )))
    }

    async fn is_logged_in(&self) -> Result<bool> {
        let client = self.transport.handle().await?;
        let response = client
            .get(self.endpoint("/1.1/account/verify_credentials.json")?)
            .headers(self.jar_headers(None).await?)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let jar = self.jar.lock().await;
        Ok(jar
            .iter()
            .map(|(key, value)| Cookie {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn user_by_handle(&self, tokens: &SessionTokens, handle: &str) -> Result<UpstreamUser> {
        let client = self.transport.handle().await?;
        let response = client
            .get(self.endpoint("/1.1/users/show.json")?)
            .query(&[("screen_name", handle)])
            .headers(auth_headers(tokens)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "user lookup for {handle} failed: {status}"
            )));
        }
        Ok(response.json().await?)
    }

    async fn user_posts(
        &self,
        tokens: &SessionTokens,
        user_id: &str,
        count: u32,
    ) -> Result<Vec<UpstreamPost>> {
        let client = self.transport.handle().await?;
        let count = count.to_string();
        let response = client
            .get(self.endpoint("/1.1/statuses/user_timeline.json")?)
            .query(&[
                ("user_id", user_id),
                ("count", count.as_str()),
                ("tweet_mode", "extended"),
            ])
            .headers(auth_headers(tokens)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("timeline fetch failed: {status}")));
        }
        Ok(response.json().await?)
    }
}

/// Headers for authenticated data calls using the session cookie pair
fn auth_headers(tokens: &SessionTokens) -> Result<HeaderMap> {
    transport::header_map(&[
        ("authorization", format!("Bearer {BEARER_TOKEN}")),
        (
            "cookie",
            format!("auth_token={}; ct0={}", tokens.auth_token, tokens.ct0),
        ),
        ("x-csrf-token", tokens.ct0.clone()),
    ])
}

#[derive(Deserialize)]
struct GuestTokenResponse {
    guest_token: String,
}

#[derive(Deserialize)]
struct FlowResponse {
    #[serde(default)]
    flow_token: String,
    #[serde(default)]
    subtasks: Vec<FlowSubtask>,
}

#[derive(Deserialize)]
struct FlowSubtask {
    subtask_id: String,
}
