use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

/// HS256 signing material shared by login and the auth middleware.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    pub fn create_jwt(&self, admin_id: i64, username: &str) -> AppResult<String> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(self.ttl_hours))
            .ok_or_else(|| AppError::Internal("token expiry overflowed".into()))?
            .timestamp();

        let claims = AdminClaims {
            sub: admin_id,
            username: username.to_owned(),
            exp: expiration as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify_jwt(&self, token: &str) -> AppResult<AdminClaims> {
        decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let keys = JwtKeys::new("secret", 1);
        let token = keys.create_jwt(3, "root").unwrap();
        let claims = keys.verify_jwt(&token).unwrap();
        assert_eq!(claims.sub, 3);
        assert_eq!(claims.username, "root");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtKeys::new("one", 1).create_jwt(3, "root").unwrap();
        let err = JwtKeys::new("two", 1).verify_jwt(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = JwtKeys::new("secret", -2).create_jwt(3, "root").unwrap();
        assert!(JwtKeys::new("secret", -2).verify_jwt(&token).is_err());
    }
}
