//! Shared JWT authentication utilities.
//!
//! Tokens are issued by the hosted auth provider and signed with a shared
//! HS256 secret. Claims and validation live here so both stockpilot-api and
//! stockpilot-gateway can use them without circular dependencies.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims issued by the auth provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as string)
    pub sub: String,
    /// Account email, when the provider includes it
    #[serde(default)]
    pub email: Option<String>,
    /// Provider role ("authenticated", "service_role", ...)
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject as a user id.
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

/// Validate and decode a JWT token.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    // The provider stamps an audience we don't pin.
    validation.validate_aud = false;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Constant-time comparison for bearer secrets.
pub fn secret_matches(provided: &str, expected: &str) -> bool {
    let a = provided.as_bytes();
    let b = expected.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
