//! Caller identity.
//!
//! The gateway in front of this service authenticates the Telegram user and
//! forwards their ID in the `X-Telegram-Id` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use database::{NewUser, User};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's Telegram user ID.
pub const TELEGRAM_ID_HEADER: &str = "x-telegram-id";

/// The calling user, registered on first sight.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Parse the caller's Telegram ID from request headers.
pub fn telegram_id_from_headers(headers: &HeaderMap) -> Result<i64, ApiError> {
    let value = headers
        .get(TELEGRAM_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized("missing X-Telegram-Id header".to_string()))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Unauthorized("invalid X-Telegram-Id header".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let telegram_id = telegram_id_from_headers(&parts.headers)?;
        let user = match state.users.get_by_telegram_id(telegram_id).await {
            Ok(user) => user,
            Err(tracker::TrackerError::NotFound { .. }) => {
                state
                    .users
                    .register(&NewUser {
                        telegram_id,
                        ..Default::default()
                    })
                    .await?
            }
            Err(e) => return Err(e.into()),
        };
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_telegram_id_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            telegram_id_from_headers(&headers),
            Err(ApiError::Unauthorized(_))
        ));

        headers.insert(TELEGRAM_ID_HEADER, HeaderValue::from_static("555"));
        assert_eq!(telegram_id_from_headers(&headers).unwrap(), 555);

        headers.insert(TELEGRAM_ID_HEADER, HeaderValue::from_static("abc"));
        assert!(telegram_id_from_headers(&headers).is_err());

        headers.insert(TELEGRAM_ID_HEADER, HeaderValue::from_static("-4"));
        assert!(telegram_id_from_headers(&headers).is_err());
    }
}
