use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AppConfig, models::Role};

/// An expired token gets a different response message than a garbage one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    expiry: Duration,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            expiry: Duration::minutes(config.jwt_expiry_minutes),
        })
    }

    /// `user_id` is the role-scoped identifier, not the table primary key.
    pub fn generate_token(&self, user_id: &str, role: Role, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.expiry;
        let claims = Claims {
            sub: user_id.to_owned(),
            role,
            email: email.to_owned(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::{JwtService, TokenError};
    use crate::{config::AppConfig, models::Role};

    fn test_config(expiry_minutes: i64) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/unused".to_string(),
            database_max_pool_size: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: expiry_minutes,
            cors_allowed_origin: None,
        }
    }

    #[test]
    fn generate_then_verify_round_trip() {
        let jwt = JwtService::from_config(&test_config(60)).unwrap();
        let token = jwt
            .generate_token("STU001", Role::Student, "stu001@example.edu")
            .unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "STU001");
        assert_eq!(claims.role, Role::Student);
        assert_eq!(claims.email, "stu001@example.edu");
    }

    #[test]
    fn expired_token_is_distinguished_from_invalid() {
        let jwt = JwtService::from_config(&test_config(-5)).unwrap();
        let token = jwt
            .generate_token("FAC001", Role::Faculty, "fac001@example.edu")
            .unwrap();

        assert_eq!(jwt.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let jwt = JwtService::from_config(&test_config(60)).unwrap();
        let token = jwt
            .generate_token("PAR001", Role::Parent, "par001@example.edu")
            .unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        assert_eq!(jwt.verify_token(&tampered), Err(TokenError::Invalid));
        assert_eq!(jwt.verify_token("not.a.jwt"), Err(TokenError::Invalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuing = JwtService::from_config(&test_config(60)).unwrap();
        let mut other_config = test_config(60);
        other_config.jwt_secret = "rotated-secret".to_string();
        let verifying = JwtService::from_config(&other_config).unwrap();

        let token = issuing
            .generate_token("STU002", Role::Student, "stu002@example.edu")
            .unwrap();
        assert_eq!(verifying.verify_token(&token), Err(TokenError::Invalid));
    }
}
