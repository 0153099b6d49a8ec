/// Credential handling: password hashes and bearer tokens
///
/// Services and middleware only see the `AuthProvider` trait; the default
/// provider pairs Argon2id hashes with HS256 JWTs.
pub mod jwt;
pub mod password;

use crate::config::AuthConfig;
use crate::error::Result;
use chrono::Duration;
use jwt::{Claims, TokenKeys};
use uuid::Uuid;

pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;

    fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool>;

    fn issue_token(&self, user_id: Uuid) -> Result<String>;

    /// User id carried by a valid, unexpired token. Invalid tokens are
    /// `AppError::Forbidden`.
    fn validate_token(&self, token: &str) -> Result<Uuid>;
}

pub struct JwtAuthProvider {
    keys: TokenKeys,
    token_lifetime: Duration,
}

impl JwtAuthProvider {
    pub fn new(secret: &str, token_lifetime: Duration) -> Self {
        Self {
            keys: TokenKeys::from_secret(secret),
            token_lifetime,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.token_expiry_hours))
    }
}

impl AuthProvider for JwtAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        password::hash_password(password)
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        password::verify_password(password, password_hash)
    }

    fn issue_token(&self, user_id: Uuid) -> Result<String> {
        self.keys.sign(&Claims::for_user(user_id, self.token_lifetime))
    }

    fn validate_token(&self, token: &str) -> Result<Uuid> {
        self.keys.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        let provider = JwtAuthProvider::new("secret", Duration::hours(24));
        let user_id = Uuid::new_v4();
        let token = provider.issue_token(user_id).unwrap();
        assert_eq!(provider.validate_token(&token).unwrap(), user_id);

        let hash = provider.hash_password("pw").unwrap();
        assert!(provider.verify_password("pw", &hash).unwrap());
    }
}
