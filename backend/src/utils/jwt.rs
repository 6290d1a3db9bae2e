use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::MAX_JWT_EXPIRATION_HOURS;
use crate::models::user::{Identity, UserRole};
use crate::types::UserId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: UserRole,
    pub email: String,
    pub exp: i64, // expiration time
    pub iat: i64, // issued at
}

impl Claims {
    pub fn new(identity: &Identity, validity: Duration) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: identity.id,
            role: identity.role,
            email: identity.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            role: self.role,
            email: self.email.clone(),
        }
    }
}

/// Issues and verifies session tokens signed with the shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validity: Duration,
}

/// Hour counts past the configured ceiling are clamped to it.
fn validity_for(hours: u64) -> Duration {
    let hours = hours.min(MAX_JWT_EXPIRATION_HOURS);
    Duration::hours(hours as i64)
}

impl TokenService {
    pub fn new(secret: &str, expiration_hours: u64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validity: validity_for(expiration_hours),
        }
    }

    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        let claims = Claims::new(identity, self.validity);
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Returns `None` for any bad signature, malformed payload or expired
    /// token. The reason is only logged.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims.identity()),
            Err(err) => {
                tracing::debug!(error = %err, "token verification failed");
                None
            }
        }
    }
}
