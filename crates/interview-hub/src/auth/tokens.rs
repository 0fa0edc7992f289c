use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::hiring::users::User;
use crate::http::ApiError;
use crate::store::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub kind: TokenKind,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn user_id(&self) -> Result<RecordId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("missing Authorization header")]
    Missing,
    #[error("expected Bearer token")]
    NotBearer,
    #[error("token is invalid or expired")]
    Invalid,
    #[error("expected a {0:?} token")]
    WrongKind(TokenKind),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Signing(detail) => ApiError::Internal(detail),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies HS256 tokens with a shared secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        user: &User,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            kind,
            iat: now.timestamp().max(0) as u64,
            exp: (now + ttl).timestamp().max(0) as u64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    pub fn pair(&self, user: &User, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user, TokenKind::Access, now)?,
            refresh: self.issue(user, TokenKind::Refresh, now)?,
        })
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;
        if data.claims.kind != expected {
            return Err(TokenError::WrongKind(expected));
        }
        Ok(data.claims)
    }

    /// Verifies the access token carried in an `Authorization: Bearer` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, TokenError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(TokenError::Missing)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(TokenError::NotBearer)?;
        self.verify(token.trim(), TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::minutes(60), Duration::hours(24))
    }

    fn user() -> User {
        User {
            id: 7,
            username: "ann".to_string(),
            email: "ann@example.com".to_string(),
            first_name: "Ann".to_string(),
            last_name: String::new(),
            phone: None,
            gender: None,
            password_hash: String::new(),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn access_tokens_authenticate_bearer_headers() {
        let issuer = issuer();
        let token = issuer
            .issue(&user(), TokenKind::Access, Utc::now())
            .expect("token");
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );

        let claims = issuer.authenticate(&headers).expect("claims");
        assert_eq!(claims.username, "ann");
        assert_eq!(claims.user_id().expect("id"), 7);
    }

    #[test]
    fn refresh_tokens_are_not_access_tokens() {
        let issuer = issuer();
        let pair = issuer.pair(&user(), Utc::now()).expect("pair");
        assert!(matches!(
            issuer.verify(&pair.refresh, TokenKind::Access),
            Err(TokenError::WrongKind(TokenKind::Access))
        ));
        assert!(issuer.verify(&pair.refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let issuer = issuer();
        let stale = issuer
            .issue(&user(), TokenKind::Access, Utc::now() - Duration::days(2))
            .expect("token");
        assert!(matches!(
            issuer.verify(&stale, TokenKind::Access),
            Err(TokenError::Invalid)
        ));

        let foreign = TokenIssuer::new("other-secret", Duration::minutes(5), Duration::hours(1))
            .issue(&user(), TokenKind::Access, Utc::now())
            .expect("token");
        assert!(issuer.verify(&foreign, TokenKind::Access).is_err());
    }

    #[test]
    fn headers_without_bearer_scheme_are_rejected() {
        let mut headers = HeaderMap::new();
        assert!(matches!(issuer().authenticate(&headers), Err(TokenError::Missing)));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(issuer().authenticate(&headers), Err(TokenError::NotBearer)));
    }
}
