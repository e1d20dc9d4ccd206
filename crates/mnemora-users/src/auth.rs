//! Password hashing (Argon2id) and JWT issuance/verification (A1).

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UserError};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| UserError::Validation(format!("could not hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| UserError::Validation(format!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// `{sub: user_id, exp}`, HS256.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub fn issue_token(user_id: &str, secret: &str, ttl_days: i64) -> Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| UserError::Auth(format!("could not issue token: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| UserError::Auth(format!("invalid token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn token_round_trips_and_carries_subject() {
        let token = issue_token("user-123", "test-secret", 7).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "user-123");
    }

    #[test]
    fn token_verification_fails_with_wrong_secret() {
        let token = issue_token("user-123", "test-secret", 7).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
