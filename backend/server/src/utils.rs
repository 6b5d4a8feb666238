use axum::http::{HeaderMap, header::AUTHORIZATION};
use pantry::Session;

use crate::{error::AppError, state::State};

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn session(state: &State, headers: &HeaderMap) -> Result<Session, AppError> {
    Ok(state.accounts.session_for(bearer_token(headers)).await?)
}

pub fn require_token(headers: &HeaderMap) -> Result<&str, AppError> {
    bearer_token(headers).ok_or(AppError::Pantry(pantry::PantryError::Unauthenticated {
        action: "manage",
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
