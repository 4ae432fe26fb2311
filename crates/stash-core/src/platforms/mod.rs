//! HTTP clients for the remote listings.
//!
//! Both clients implement [`BookmarkSource`](crate::sync::BookmarkSource) and
//! [`TokenRefresher`](crate::auth::TokenRefresher), map HTTP 401 to
//! [`Error::Unauthorized`] and every other failure status to [`Error::Api`].

mod reddit;
mod twitter;

pub use reddit::RedditClient;
pub use twitter::TwitterClient;

use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::auth::TokenPair;
use crate::util::compact_text;
use crate::{Error, Result};

/// Pass successful responses through, turn the rest into errors
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api(parse_api_error(status, &body)));
    }
    Ok(response)
}

/// Token endpoints answer 400/401 for a revoked grant; none of it is retryable.
async fn parse_token_response(response: Response) -> Result<TokenPair> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api(parse_api_error(status, &body)));
    }
    let payload = response.json::<OAuthTokenResponse>().await?;
    if payload.access_token.trim().is_empty() {
        return Err(Error::Api(
            "Token response did not include an access token".to_string(),
        ));
    }
    Ok(TokenPair {
        access_token: payload.access_token,
        refresh_token: payload
            .refresh_token
            .filter(|token| !token.trim().is_empty()),
    })
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    detail: Option<String>,
    title: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorResponse>(body) {
        let error_text = payload
            .error
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        if let Some(message) = payload
            .detail
            .or(payload.error_description)
            .or(payload.message)
            .or_else(|| payload.errors.into_iter().find_map(|entry| entry.message))
            .or(payload.title)
            .or(error_text)
        {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
