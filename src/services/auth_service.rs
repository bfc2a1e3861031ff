use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::crypto::verify_password;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    secret: String,
    username: String,
    password_hash: String,
    ttl_minutes: i64,
}

impl AuthService {
    pub fn new(secret: String, username: String, password_hash: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            username,
            password_hash,
            ttl_minutes,
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(String, DateTime<Utc>)> {
        let name_ok = username.trim() == self.username;
        let password_ok = !self.password_hash.is_empty() && verify_password(password, &self.password_hash)?;
        if !(name_ok && password_ok) {
            tracing::warn!("Rejected admin login for '{}'", username);
            return Err(Error::Unauthorized("invalid_credentials".to_string()));
        }
        let (token, expires_at) = self.issue(&self.username)?;
        tracing::info!("Admin '{}' logged in", self.username);
        Ok((token, expires_at))
    }

    pub fn issue(&self, subject: &str) -> Result<(String, DateTime<Utc>)> {
        let expires_at = Utc::now() + chrono::Duration::minutes(self.ttl_minutes);
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp() as usize,
            role: Some(ADMIN_ROLE.to_string()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::hash_password;

    fn service() -> AuthService {
        AuthService::new(
            "test_secret_key".into(),
            "admin".into(),
            hash_password("pa55word").unwrap(),
            60,
        )
    }

    #[test]
    fn login_issues_verifiable_admin_token() {
        let auth = service();
        let (token, expires_at) = auth.login("admin", "pa55word").unwrap();
        assert!(expires_at > Utc::now());
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role.as_deref(), Some(ADMIN_ROLE));
    }

    #[test]
    fn rejects_bad_credentials() {
        let auth = service();
        assert!(matches!(auth.login("admin", "nope"), Err(Error::Unauthorized(_))));
        assert!(matches!(auth.login("root", "pa55word"), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let other = AuthService::new("other".into(), "admin".into(), String::new(), 60);
        let (token, _) = other.issue("admin").unwrap();
        assert!(service().verify(&token).is_err());
    }
}
