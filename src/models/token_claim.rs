use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Role, User};

/// How long an issued token stays valid
pub const TOKEN_TTL_DAYS: i64 = 1;

/// Claims carried by the bearer token handed out on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaim {
    pub id: i32,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl TokenClaim {
    pub fn new(id: i32, role: Role, now: DateTime<Utc>) -> Self {
        TokenClaim {
            id,
            role,
            iat: now.timestamp() as usize,
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.id, user.role, Utc::now())
    }

    pub fn encode(&self, secret: &str) -> jsonwebtoken::errors::Result<String> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_ref()),
        )
    }

    /// Validates signature and expiry of `token`, returning its claims
    pub fn decode(token: &str, secret: &str) -> jsonwebtoken::errors::Result<Self> {
        let data = decode::<TokenClaim>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
