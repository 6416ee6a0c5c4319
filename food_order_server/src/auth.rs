//! Access tokens.
//!
//! Users are authenticated by the identity provider, which issues HS256 JWTs signed with a secret shared with this
//! server. Every `/api` route (except the payment processor webhook) expects one in an `Authorization: Bearer` header.
//!
//! Adding [`JwtClaims`] as a handler argument is all a route needs to do to require authentication. The claims are
//! extracted and validated before the handler runs, and a missing, malformed or expired token results in a 401.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use food_order_engine::db_types::{Participant, UserId};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn participant(&self) -> Participant {
        Participant { id: UserId(self.sub.clone()), email: self.email.clone(), name: self.name.clone() }
    }
}

/// Signs access tokens. The server only needs this for tooling and tests; in production, tokens come from the identity
/// provider.
pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime }
    }

    pub fn issue_token(&self, participant: &Participant, duration: Option<Duration>) -> Result<String, AuthError> {
        let exp = Utc::now() + duration.unwrap_or(self.lifetime);
        let claims = JwtClaims {
            sub: participant.id.to_string(),
            email: participant.email.clone(),
            name: participant.name.clone(),
            exp: exp.timestamp(),
        };
        encode(&Header::default(), &claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        let claims = data.claims;
        if claims.sub.trim().is_empty() || claims.email.trim().is_empty() {
            return Err(AuthError::ValidationError("The token does not identify a user".into()));
        }
        Ok(claims)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let validator = req.app_data::<web::Data<TokenValidator>>().ok_or_else(|| {
        error!("🔐️ No token validator has been configured. Every authenticated request will fail.");
        ServerError::ConfigurationError("Token validation is not configured".into())
    })?;
    let token = bearer_token(req)?;
    let claims = validator.validate(token).map_err(|e| {
        debug!("🔐️ Rejecting request to {}. {e}", req.path());
        e
    })?;
    trace!("🔐️ Authenticated {} for {}", claims.sub, req.path());
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}
