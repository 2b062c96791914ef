use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

use super::{Caller, Role};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Token claims: who the caller is, what they may do, and until when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Some issuers call this `id`.
    #[serde(alias = "id")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl Claims {
    /// Verify a token string and extract its claims. Expired tokens are rejected.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        let data = jsonwebtoken::decode::<Self>(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}
