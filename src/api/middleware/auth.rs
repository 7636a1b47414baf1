//! API key authentication for the gateway surface

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::api_key::ApiKey;

const API_KEY_HEADER: &str = "x-api-key";

/// Extractor that requires a valid, unrevoked and unexpired project API key
///
/// The key is read from `Authorization: Bearer <key>` or `X-API-Key: <key>`.
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub ApiKey);

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = extract_api_key(&parts.headers)?;

        debug!(
            key_prefix = %secret.chars().take(16).collect::<String>(),
            "Validating API key"
        );

        let api_key = state
            .api_key_service
            .validate(&secret)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid, revoked or expired API key"))?;

        Ok(RequireApiKey(api_key))
    }
}

fn extract_api_key(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

        if let Some(token) = value.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(value) = headers.get(API_KEY_HEADER) {
        let key = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid X-API-Key header encoding"))?;

        return Ok(key.trim().to_string());
    }

    Err(ApiError::unauthorized(
        "API key required. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer gw_live_one".parse().unwrap());
        headers.insert(API_KEY_HEADER, "gw_live_two".parse().unwrap());

        assert_eq!(extract_api_key(&headers).unwrap(), "gw_live_one");
    }

    #[test]
    fn test_x_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "  gw_live_two ".parse().unwrap());

        assert_eq!(extract_api_key(&headers).unwrap(), "gw_live_two");
    }

    #[test]
    fn test_missing_or_wrong_scheme() {
        let err = extract_api_key(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_api_key(&headers).is_err());
    }
}
