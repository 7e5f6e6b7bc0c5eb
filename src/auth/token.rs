use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::db::User;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // User email
    pub user_id: i64,
    pub is_agent: bool,
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

/// Signs and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    /// Fails when no signing secret is configured; callers treat this as fatal.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let secret = config.signing_secret().ok_or_else(|| {
            AppError::ConfigError("auth.jwt_secret is not set".to_string())
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl: Duration::minutes(config.token_expiry_minutes),
        })
    }

    pub fn issue_for(&self, user: &User) -> Result<String, AppError> {
        self.issue(&user.email, user.id, user.is_agent, self.default_ttl)
    }

    pub fn issue(
        &self,
        email: &str,
        user_id: i64,
        is_agent: bool,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            user_id,
            is_agent,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}
