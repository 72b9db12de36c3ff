//! Bearer token signing and verification (HS256).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use frontdesk_config::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id of the agent
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    token_duration: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, token_duration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            token_duration,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            Duration::from_secs(config.token_ttl_seconds),
        )
    }

    /// Sign a token whose subject is `user_id`.
    pub fn issue(&self, user_id: &str) -> GatewayResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| GatewayError::InternalError("System time error".to_string()))?;
        let exp = now + self.token_duration;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.as_secs() as usize,
            iat: now.as_secs() as usize,
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| GatewayError::InternalError(format!("Failed to encode token: {}", e)))
    }

    /// Check signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> GatewayResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}
