use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::auth::token::{IssuedToken, TokenKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub typ: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token expired")]
    Expired,
    #[error("token is not a {expected} token")]
    WrongKind { expected: TokenKind },
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signer for access and refresh tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_secs.max(1)),
            refresh_ttl: Duration::seconds(refresh_ttl_secs.max(1)),
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<IssuedToken, JwtError> {
        self.issue_at(user_id, kind, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = now + self.ttl(kind);
        let claims = Claims {
            sub: user_id.to_string(),
            typ: kind,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(JwtError::Signing)?;
        Ok(IssuedToken {
            token,
            kind,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e),
            },
        )?;
        if data.claims.typ != expected {
            return Err(JwtError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("unit-test-secret-0123456789", 900, 3600)
    }

    #[test]
    fn issued_access_token_decodes_to_user() {
        let svc = service();
        let uid = Uuid::new_v4();
        let issued = svc.issue(uid, TokenKind::Access).unwrap();
        let claims = svc.decode(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id(), Some(uid));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let svc = service();
        let issued = svc.issue(Uuid::new_v4(), TokenKind::Refresh).unwrap();
        assert!(matches!(
            svc.decode(&issued.token, TokenKind::Access),
            Err(JwtError::WrongKind {
                expected: TokenKind::Access
            })
        ));
        assert!(svc.decode(&issued.token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn tokens_issued_together_differ() {
        let svc = service();
        let uid = Uuid::new_v4();
        let now = Utc::now();
        let a = svc.issue_at(uid, TokenKind::Access, now).unwrap();
        let b = svc.issue_at(uid, TokenKind::Access, now).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let issued = svc
            .issue_at(
                Uuid::new_v4(),
                TokenKind::Access,
                Utc::now() - Duration::hours(2),
            )
            .unwrap();
        assert!(matches!(
            svc.decode(&issued.token, TokenKind::Access),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = JwtService::new("another-secret-9876543210", 900, 3600);
        let issued = other.issue(Uuid::new_v4(), TokenKind::Access).unwrap();
        assert!(matches!(
            service().decode(&issued.token, TokenKind::Access),
            Err(JwtError::Invalid(_))
        ));
    }
}
