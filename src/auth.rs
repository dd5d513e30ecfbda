//! Signed session tokens.
//!
//! Sessions are reconstructed from the bearer token alone, without a
//! database round-trip: the token carries the user's id and role next to the
//! standard identity fields.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request, StatusCode},
    response::{IntoResponse, Response},
    RequestPartsExt as _,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    api::{self, user::Role},
    config,
    server::SharedAppState,
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claims {
    pub id: api::user::Id,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &api::SessionUser, ttl: Duration) -> Self {
        let expires_at = OffsetDateTime::now_utc() + ttl;
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            picture: user.image.clone(),
            exp: expires_at.unix_timestamp(),
        }
    }

    pub fn require(&self, role: Role) -> Result<(), AuthError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    pub fn into_session(self) -> Result<api::Session, AuthError> {
        let expires = OffsetDateTime::from_unix_timestamp(self.exp)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(api::Session {
            user: api::SessionUser {
                id: self.id,
                email: self.email,
                name: self.name,
                role: self.role,
                image: self.picture,
            },
            expires,
        })
    }
}

#[derive(Clone)]
pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Keys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &config::Jwt) -> Self {
        Self::new(config.secret.as_bytes(), config.expiration_time)
    }

    /// Signs a session token for `user` that expires after the configured
    /// lifetime.
    pub fn issue(
        &self,
        user: &api::SessionUser,
    ) -> Result<String, AuthError> {
        self.encode(&Claims::new(user, self.ttl))
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("rejected token: {e}");
                AuthError::InvalidToken
            })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthError {
    InvalidToken,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
        .into_response()
    }
}

#[async_trait]
impl FromRequestParts<SharedAppState> for Claims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        state.keys.decode(bearer.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn keys() -> Keys {
        Keys::new(b"secret", HOUR)
    }

    fn trainer() -> api::SessionUser {
        api::SessionUser {
            id: api::user::Id::from(7),
            email: "deniz@example.com".into(),
            name: "Deniz".into(),
            role: Role::Trainer,
            image: Some("https://cdn.example/deniz.png".into()),
        }
    }

    #[test]
    fn token_reconstructs_session() {
        let keys = keys();
        let claims = Claims::new(&trainer(), Duration::from_secs(3600));

        let token = keys.encode(&claims).unwrap();
        let session = keys.decode(&token).unwrap().into_session().unwrap();

        assert_eq!(session.user, trainer());
        assert_eq!(session.expires.unix_timestamp(), claims.exp);
    }

    #[test]
    fn issued_token_expires_after_configured_lifetime() {
        let keys = Keys::from_config(&config::Jwt {
            secret: "secret".into(),
            expiration_time: Duration::from_secs(30 * 24 * 60 * 60),
        });
        let before = OffsetDateTime::now_utc();

        let token = keys.issue(&trainer()).unwrap();
        let session = keys.decode(&token).unwrap().into_session().unwrap();

        let lifetime = session.expires - before;
        assert!(lifetime > time::Duration::days(29), "{lifetime}");
        assert!(
            lifetime <= time::Duration::days(30) + time::Duration::SECOND,
            "{lifetime}",
        );
        assert_eq!(session.user, trainer());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let claims = Claims::new(&trainer(), Duration::from_secs(3600));
        let token = Keys::new(b"other", HOUR).encode(&claims).unwrap();

        assert_eq!(
            keys().decode(&token),
            Err(AuthError::InvalidToken),
        );
    }

    #[test]
    fn rejects_expired_token() {
        let keys = keys();
        let mut claims = Claims::new(&trainer(), Duration::ZERO);
        claims.exp -= 3600;

        let token = keys.encode(&claims).unwrap();

        assert_eq!(keys.decode(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn requires_exact_role() {
        let claims = Claims::new(&trainer(), Duration::from_secs(60));

        assert_eq!(claims.require(Role::Trainer), Ok(()));
        assert_eq!(claims.require(Role::Admin), Err(AuthError::Forbidden));
    }
}
