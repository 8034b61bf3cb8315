/// Authentication service - JWT issuing and verification
use crate::error::{Result, ServerError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use nest_core::OwnerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AuthService {
    secret: String,
    access_token_expiration: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (owner ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl AuthService {
    pub fn new(secret: String, access_expiration_hours: u64) -> Self {
        Self {
            secret,
            access_token_expiration: Duration::hours(access_expiration_hours as i64),
        }
    }

    /// Create an access token whose subject is `owner`
    pub fn create_access_token(&self, owner: &OwnerId) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.access_token_expiration;

        let claims = Claims {
            sub: owner.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &encoding_key).map_err(ServerError::from)
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Verify a token and return the owner it was issued for
    pub fn verify_access_token(&self, token: &str) -> Result<OwnerId> {
        let claims = self.verify_token(token)?;
        if claims.sub.trim().is_empty() {
            return Err(ServerError::Auth("Token has no subject".to_string()));
        }
        Ok(OwnerId::new(claims.sub))
    }
}
