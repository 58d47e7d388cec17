//! Credentials: password hashing, signed access tokens and the request
//! extractor that resolves them to a user.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::AppError,
    models::{AuthToken, User},
    repositories::{TokenRepository, UserRepository},
    AppState,
};

/// Name of the session cookie set by login.
pub const SESSION_COOKIE: &str = "access_token";

/// JWT claims. `jti` is the key of the server-side token row.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i32,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Malformed hashes count as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Sign an access token for a stored token row.
pub fn issue_token(token: &AuthToken, config: &Config) -> Result<String, AppError> {
    let now = Utc::now();
    let expires = now
        .checked_add_signed(config.token_ttl)
        .ok_or_else(|| AppError::Internal("token expiry out of range".to_string()))?;
    let claims = Claims {
        sub: token.user_id,
        jti: token.key.clone(),
        iat: now.timestamp(),
        exp: expires.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.jwt_secret),
    )
    .map_err(|e| AppError::Internal(format!("token generation failed: {e}")))
}

pub fn decode_token(token: &str, config: &Config) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&config.jwt_secret),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

/// `Set-Cookie` value carrying the access token.
pub fn session_cookie(token: &str, config: &Config) -> String {
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly{secure}; SameSite=Strict; Path=/; Max-Age={}",
        config.token_ttl.num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie(config: &Config) -> String {
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; HttpOnly{secure}; SameSite=Strict; Path=/; Max-Age=0")
}

/// Pull the raw credential from `Authorization: Token|Bearer <jwt>` or the
/// session cookie. The header wins when both are present.
fn credential_from(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            h.strip_prefix("Token ")
                .or_else(|| h.strip_prefix("Bearer "))
        })
        .map(|t| t.trim().to_string());
    if from_header.is_some() {
        return from_header;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = credential_from(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = decode_token(&raw, &state.config)?;

        let mut conn = state.conn()?;
        let token = TokenRepository::find_by_key(&mut conn, &claims.jti)?
            .filter(|t| t.user_id == claims.sub)
            .ok_or(AppError::InvalidToken)?;
        let user = UserRepository::find_by_id(&mut conn, token.user_id)?
            .ok_or(AppError::InvalidToken)?;

        if state.config.require_activation && !user.is_active {
            return Err(AppError::InactiveAccount);
        }

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn token_row() -> AuthToken {
        AuthToken {
            key: "0123456789abcdef0123456789abcdef".to_string(),
            user_id: 7,
            created: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_issued_token_decodes_to_row() {
        let config = Config::test_default();
        let jwt = issue_token(&token_row(), &config).unwrap();

        let claims = decode_token(&jwt, &config).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.jti, token_row().key);
    }

    #[test]
    fn test_token_signed_with_other_key_is_rejected() {
        let mut other = Config::test_default();
        other.jwt_secret = b"a_completely_different_secret!!".to_vec();
        let jwt = issue_token(&token_row(), &other).unwrap();

        let err = decode_token(&jwt, &Config::test_default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_credential_prefers_header_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; access_token=from-cookie"));
        assert_eq!(credential_from(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token from-header"));
        assert_eq!(credential_from(&headers).as_deref(), Some("from-header"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(credential_from(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("doc1234", crate::config::MIN_BCRYPT_COST).unwrap();
        assert!(verify_password("doc1234", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("doc1234", "not-a-hash"));
    }
}
