//! Stateless HS256 session tokens.
//!
//! A token carries everything [`CurrentUser`] needs, including the role at issue time. The
//! extractor re-reads the user row on every request, so a role change or deletion takes effect
//! before the token expires.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::Error,
    types::UserId,
};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for `user`, valid for the configured `jwt_expiry` from now
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let issued_at = Utc::now();

        Self {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + config.auth.security.jwt_expiry).timestamp(),
        }
    }

    fn into_user(self) -> CurrentUser {
        CurrentUser {
            id: self.sub,
            username: self.username,
            email: self.email,
            role: self.role,
        }
    }
}

fn signing_secret(config: &Config) -> Result<&[u8], Error> {
    config
        .secret_key
        .as_deref()
        .map(str::as_bytes)
        .ok_or_else(|| Error::Internal {
            operation: "sign session: secret_key is not configured".to_string(),
        })
}

/// Failures on our side (key material, crypto backend) are 500s. Anything wrong with the
/// presented token itself, including an expired one, is a 401.
fn token_error(e: jsonwebtoken::errors::Error) -> Error {
    match e.kind() {
        ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::RsaFailedSigning
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("session token: {e}"),
        },
        _ => Error::Unauthenticated { message: None },
    }
}

pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let key = EncodingKey::from_secret(signing_secret(config)?);

    jsonwebtoken::encode(&Header::new(ALGORITHM), &SessionClaims::new(user, config), &key).map_err(|e| Error::Internal {
        operation: format!("create session token: {e}"),
    })
}

/// Check signature and expiry, then rebuild the user the token was issued for
pub fn verify_session_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(signing_secret(config)?);

    let mut validation = Validation::new(ALGORITHM);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = jsonwebtoken::decode::<SessionClaims>(token, &key, &validation).map_err(token_error)?;
    Ok(data.claims.into_user())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config_with_secret(secret: &str) -> Config {
        let mut config = Config {
            secret_key: Some(secret.to_string()),
            ..Default::default()
        };
        config.auth.security.jwt_expiry = Duration::from_secs(3600);
        config
    }

    fn manager() -> CurrentUser {
        CurrentUser {
            id: 42,
            username: "dispatcher".to_string(),
            email: "dispatcher@example.com".to_string(),
            role: Role::Manager,
        }
    }

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_token_carries_user_and_role() {
        let config = config_with_secret("signing-secret");

        let token = create_session_token(&manager(), &config).unwrap();
        let user = verify_session_token(&token, &config).unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.username, "dispatcher");
        assert_eq!(user.email, "dispatcher@example.com");
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn test_expiry_follows_config() {
        let mut config = config_with_secret("signing-secret");
        config.auth.security.jwt_expiry = Duration::from_secs(120);

        let claims = SessionClaims::new(&manager(), &config);
        assert_eq!(claims.exp - claims.iat, 120);
    }

    #[test]
    fn test_rejected_tokens_are_unauthenticated() {
        let config = config_with_secret("signing-secret");
        let now = Utc::now().timestamp();

        let expired = SessionClaims {
            iat: now - 7200,
            exp: now - 3600,
            ..SessionClaims::new(&manager(), &config)
        };
        let foreign = create_session_token(&manager(), &config_with_secret("someone-else")).unwrap();

        for token in [
            sign(&expired, "signing-secret"),
            foreign,
            "not.a.token".to_string(),
            "garbage".to_string(),
            String::new(),
        ] {
            let result = verify_session_token(&token, &config);
            assert!(matches!(result, Err(Error::Unauthenticated { .. })), "accepted {token:?}");
        }
    }

    #[test]
    fn test_unknown_role_claim_is_rejected() {
        let config = config_with_secret("signing-secret");
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": 1, "username": "x", "email": "x@example.com", "role": "ROLE_ROOT", "iat": now, "exp": now + 60,
        });
        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(b"signing-secret")).unwrap();

        assert!(matches!(verify_session_token(&token, &config), Err(Error::Unauthenticated { .. })));
    }

    #[test]
    fn test_missing_secret_is_internal_error() {
        let config = Config::default();

        assert!(matches!(create_session_token(&manager(), &config), Err(Error::Internal { .. })));
        assert!(matches!(verify_session_token("a.b.c", &config), Err(Error::Internal { .. })));
    }
}
