use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Role;
use crate::config;

pub mod password;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { sub: user_id, role, exp, iat: now.timestamp() }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_expire_in_the_future() {
        let claims = Claims::new(Uuid::new_v4(), Role::Patient);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn role_round_trips_through_serde() {
        let claims = Claims::new(Uuid::new_v4(), Role::Caregiver);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "CAREGIVER");

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back.role, Role::Caregiver);
    }

    #[test]
    fn unknown_role_is_rejected_at_deserialization() {
        let json = serde_json::json!({
            "sub": Uuid::new_v4(),
            "role": "AUDITOR",
            "exp": 0,
            "iat": 0
        });
        assert!(serde_json::from_value::<Claims>(json).is_err());
    }
}
