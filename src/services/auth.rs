//! Bearer token issuance and validation.
//!
//! Authentication is a single shared identity: tokens are only issued when
//! the candidate username and secret word exactly match the configured
//! values, and every validated token must carry that same username.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TOKEN_LIFETIME_DAYS: i64 = 365;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("invalid {0}")]
    InvalidCredentials(&'static str),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims embedded in issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,
    pub username: String,
    pub exp: usize,
}

/// Issues and validates HS256-signed bearer tokens.
pub struct AuthService {
    jwt_secret: Option<String>,
    expected_username: Option<String>,
    expected_secret_word: Option<String>,
}

impl AuthService {
    pub fn new(
        jwt_secret: Option<String>,
        expected_username: Option<String>,
        expected_secret_word: Option<String>,
    ) -> Self {
        Self {
            jwt_secret,
            expected_username,
            expected_secret_word,
        }
    }

    /// Issue a token for the shared identity.
    ///
    /// Both candidate values must match configuration exactly; the token
    /// carries `{authorized, username, exp}` with a one-year expiry.
    pub fn issue(&self, username: &str, secret_word: &str) -> Result<String, AuthError> {
        let expected_secret = self
            .expected_secret_word
            .as_deref()
            .ok_or(AuthError::NotConfigured("auth secret word"))?;
        let expected_username = self
            .expected_username
            .as_deref()
            .ok_or(AuthError::NotConfigured("letterboxd username"))?;
        let jwt_secret = self
            .jwt_secret
            .as_deref()
            .ok_or(AuthError::NotConfigured("jwt secret"))?;

        if secret_word != expected_secret {
            return Err(AuthError::InvalidCredentials("secret word"));
        }
        if username != expected_username {
            return Err(AuthError::InvalidCredentials("username"));
        }

        let claims = Claims {
            authorized: true,
            username: username.to_string(),
            exp: (Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt_secret.as_bytes()),
        )?)
    }

    /// Validate a token against the signing key and the expected username.
    ///
    /// Any structural, signature, or expiry failure yields false; this never
    /// errors across the boundary.
    pub fn validate(&self, token: &str, expected_username: &str) -> bool {
        let Some(jwt_secret) = self.jwt_secret.as_deref() else {
            return false;
        };

        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => data.claims.authorized && data.claims.username == expected_username,
            Err(_) => false,
        }
    }
}
