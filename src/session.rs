//! Session acquisition
//!
//! Produces the cookie pair that authenticates data calls, preferring the
//! on-disk cache and falling back to a fresh interactive login. Login is the
//! one operation where retrying is gated on error classification: only a
//! service-unavailable response is worth waiting out, anything else (bad
//! password, unanswerable challenge) fails immediately.

use crate::config::{AccountConfig, RetryConfig};
use crate::cookie_cache::{CookieCache, SessionTokens};
use crate::error::{Error, Result};
use crate::retry::backoff_delay;
use crate::twitter::{LoginCredentials, TwitterClient};

/// Obtain a valid session, from the cache or by logging in
///
/// A cache hit returns without touching the network. On a miss the account
/// credentials are required, the login flow runs under the login retry
/// policy, the session is verified, and the extracted cookie pair is written
/// back to the cache before being returned.
///
/// # Errors
///
/// Fails when credentials are missing from the configuration, when login is
/// denied or exhausts its retry budget, when the upstream does not accept the
/// resulting session, or when the expected cookies are absent after login.
pub async fn acquire_session(
    client: &dyn TwitterClient,
    cache: &CookieCache,
    account: &AccountConfig,
) -> Result<SessionTokens> {
    if let Some(tokens) = cache.load() {
        tracing::info!("Using cached session cookies");
        return Ok(tokens);
    }

    let username = require(&account.username, "account.username")?;
    let password = require(&account.password, "account.password")?;

    let credentials = LoginCredentials {
        username,
        password,
        email: account.email_address.clone(),
        otp_secret: account.otp_secret.clone(),
    };

    login_with_retry(client, &credentials, &RetryConfig::login()).await?;

    if !client.is_logged_in().await? {
        return Err(Error::Auth(
            "login flow finished but the session was not accepted".to_string(),
        ));
    }

    let cookies = client.cookies().await?;
    let auth_token = cookie_value(&cookies, "auth_token");
    let ct0 = cookie_value(&cookies, "ct0");
    let (Some(auth_token), Some(ct0)) = (auth_token, ct0) else {
        return Err(Error::Auth(
            "could not get auth_token or ct0 from the login session".to_string(),
        ));
    };

    let tokens = SessionTokens { auth_token, ct0 };
    if let Err(e) = cache.save(&tokens) {
        // The session in hand is still valid; next run just logs in again
        tracing::warn!(error = %e, "Could not save session cookies");
    }

    Ok(tokens)
}

/// Run the login flow, retrying only service-unavailable failures
///
/// Exhausting the budget on retryable failures yields a distinct auth error
/// so operators can tell an unavailable upstream from rejected credentials.
pub async fn login_with_retry(
    client: &dyn TwitterClient,
    credentials: &LoginCredentials,
    retry: &RetryConfig,
) -> Result<()> {
    let mut attempt = 0;

    loop {
        match client.login(credentials).await {
            Ok(()) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Login succeeded after retry");
                }
                return Ok(());
            }
            Err(e) if !e.is_service_unavailable() => return Err(e),
            Err(e) => {
                attempt += 1;
                if attempt >= retry.max_attempts {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Upstream stayed unavailable through every login attempt"
                    );
                    return Err(Error::Auth(format!(
                        "login failed after {attempt} attempts: {e}"
                    )));
                }

                let delay = backoff_delay(retry, attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = retry.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Upstream unavailable during login, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn require(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config(format!("{key} is required to log in"), key))
}

fn cookie_value(cookies: &[crate::twitter::Cookie], key: &str) -> Option<String> {
    cookies
        .iter()
        .find(|c| c.key == key)
        .map(|c| c.value.clone())
        .filter(|v| !v.is_empty())
}
