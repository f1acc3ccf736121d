use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::UserRepository;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub struct AuthService;

impl AuthService {
    /// Hash a plaintext password with bcrypt.
    pub fn hash_password(password: &str) -> AppResult<String> {
        Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
    }

    /// Verify a plaintext password against a stored bcrypt hash.
    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Create a signed JWT for a user id
    pub fn create_jwt(state: &Arc<AppState>, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(state.config.jwt.expiration_hours);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT, returning the claims
    pub fn decode_jwt(state: &Arc<AppState>, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Get user from JWT token
    pub async fn get_user_from_token(
        state: &Arc<AppState>,
        token: &str,
    ) -> AppResult<crate::db::User> {
        let claims = Self::decode_jwt(state, token)?;
        let user = UserRepository::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn password_roundtrip() {
        let hash = AuthService::hash_password("hunter2").unwrap();
        assert!(AuthService::verify_password("hunter2", &hash).unwrap());
        assert!(!AuthService::verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn jwt_roundtrip_with_matching_secret() {
        let now = Utc::now();
        let claims = Claims {
            sub: "user-123".to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "user-123");

        // A different secret must not validate.
        assert!(decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::default(),
        )
        .is_err());
    }
}
