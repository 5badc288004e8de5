//! JWT token handling
//!
//! Access and refresh tokens are HS256 JWTs carrying the same identity and a
//! `type` claim. Validation pins the algorithm, the issuer and the type, and
//! every failure is reported as the same `InvalidToken`.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult, TokenClaims, TokenKind, TokenPair, UserRole};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signed payload
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    /// User id
    sub: String,
    email: String,
    role: UserRole,
    #[serde(rename = "type")]
    token_type: TokenKind,
    iss: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    jti: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, issuer: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Sign an access/refresh pair for `claims`.
    pub fn issue_pair(&self, claims: &TokenClaims) -> DomainResult<TokenPair> {
        let now = Utc::now();
        let access_exp = (now + self.access_ttl).timestamp();
        let refresh_exp = (now + self.refresh_ttl).timestamp();

        let access_token = self.sign(claims, TokenKind::Access, now.timestamp(), access_exp)?;
        let refresh_token = self.sign(claims, TokenKind::Refresh, now.timestamp(), refresh_exp)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_at: access_exp,
            token_type: "Bearer".to_string(),
        })
    }

    pub fn validate_access(&self, token: &str) -> DomainResult<TokenClaims> {
        self.validate(token, TokenKind::Access)
    }

    pub fn validate_refresh(&self, token: &str) -> DomainResult<TokenClaims> {
        self.validate(token, TokenKind::Refresh)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented refresh token stays valid until it expires.
    pub fn refresh_pair(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let claims = self.validate_refresh(refresh_token)?;
        self.issue_pair(&claims)
    }

    fn sign(
        &self,
        claims: &TokenClaims,
        kind: TokenKind,
        iat: i64,
        exp: i64,
    ) -> DomainResult<String> {
        let payload = JwtClaims {
            sub: claims.user_id.to_string(),
            email: claims.email.clone(),
            role: claims.role,
            token_type: kind,
            iss: self.issuer.clone(),
            iat,
            nbf: iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(ALGORITHM), &payload, &self.encoding_key).map_err(|e| {
            debug!(error = %e, kind = kind.as_str(), "Token signing failed");
            DomainError::Signing
        })
    }

    fn validate(&self, token: &str, expected: TokenKind) -> DomainResult<TokenClaims> {
        let header = decode_header(token).map_err(|e| reject("malformed header", &e))?;
        if header.alg != ALGORITHM {
            debug!(alg = ?header.alg, "Token rejected: unexpected algorithm");
            return Err(DomainError::InvalidToken);
        }

        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| reject("verification failed", &e))?;
        let payload = data.claims;

        if payload.token_type != expected {
            debug!(
                expected = expected.as_str(),
                actual = payload.token_type.as_str(),
                "Token rejected: wrong type"
            );
            return Err(DomainError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&payload.sub).map_err(|_| {
            debug!("Token rejected: subject is not a user id");
            DomainError::InvalidToken
        })?;

        Ok(TokenClaims {
            user_id,
            email: payload.email,
            role: payload.role,
        })
    }
}

fn reject(stage: &str, e: &jsonwebtoken::errors::Error) -> DomainError {
    debug!(stage, error = %e, "Token rejected");
    DomainError::InvalidToken
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes!";

    fn service() -> TokenService {
        TokenService::new(SECRET, "identity-test", Duration::minutes(15), Duration::days(7))
    }

    fn claims() -> TokenClaims {
        TokenClaims {
            user_id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            role: UserRole::User,
        }
    }

    fn forge(kind: TokenKind, alg: Algorithm, secret: &str, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let payload = JwtClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.com".to_string(),
            role: UserRole::Admin,
            token_type: kind,
            iss: "identity-test".to_string(),
            iat: now,
            nbf: now,
            exp: now + exp_offset,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::new(alg),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let service = service();
        let claims = claims();
        let pair = service.issue_pair(&claims).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.token_type, "Bearer");
        assert!(pair.expires_at > Utc::now().timestamp());

        assert_eq!(service.validate_access(&pair.access_token).unwrap(), claims);
        assert_eq!(service.validate_refresh(&pair.refresh_token).unwrap(), claims);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let service = service();
        let pair = service.issue_pair(&claims()).unwrap();

        assert!(matches!(
            service.validate_refresh(&pair.access_token),
            Err(DomainError::InvalidToken)
        ));
        assert!(matches!(
            service.validate_access(&pair.refresh_token),
            Err(DomainError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_rotates_both_tokens() {
        let service = service();
        let claims = claims();
        let pair = service.issue_pair(&claims).unwrap();

        let rotated = service.refresh_pair(&pair.refresh_token).unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        assert_eq!(service.validate_access(&rotated.access_token).unwrap(), claims);

        assert!(matches!(
            service.refresh_pair(&pair.access_token),
            Err(DomainError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = service();
        let pair = service.issue_pair(&claims()).unwrap();

        let mut parts: Vec<&str> = pair.access_token.split('.').collect();
        let forged_payload = forge(TokenKind::Access, ALGORITHM, SECRET, 600);
        parts[1] = forged_payload.split('.').nth(1).unwrap();
        let tampered = parts.join(".");

        assert!(matches!(
            service.validate_access(&tampered),
            Err(DomainError::InvalidToken)
        ));
        assert!(matches!(
            service.validate_access("not.a.jwt"),
            Err(DomainError::InvalidToken)
        ));
    }

    #[test]
    fn other_algorithms_and_secrets_are_rejected() {
        let service = service();

        let hs512 = forge(TokenKind::Access, Algorithm::HS512, SECRET, 600);
        assert!(matches!(
            service.validate_access(&hs512),
            Err(DomainError::InvalidToken)
        ));

        let wrong_secret = forge(
            TokenKind::Access,
            ALGORITHM,
            "another-secret-of-sufficient-length",
            600,
        );
        assert!(matches!(
            service.validate_access(&wrong_secret),
            Err(DomainError::InvalidToken)
        ));

        let good = forge(TokenKind::Access, ALGORITHM, SECRET, 600);
        assert!(service.validate_access(&good).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = forge(TokenKind::Access, ALGORITHM, SECRET, -5);
        assert!(matches!(
            service().validate_access(&expired),
            Err(DomainError::InvalidToken)
        ));

        let short_lived = TokenService::new(
            SECRET,
            "identity-test",
            Duration::seconds(-1),
            Duration::days(7),
        );
        let pair = short_lived.issue_pair(&claims()).unwrap();
        assert!(short_lived.validate_access(&pair.access_token).is_err());
        assert!(short_lived.validate_refresh(&pair.refresh_token).is_ok());
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let other = TokenService::new(
            SECRET,
            "someone-else",
            Duration::minutes(15),
            Duration::days(7),
        );
        let pair = other.issue_pair(&claims()).unwrap();
        assert!(matches!(
            service().validate_access(&pair.access_token),
            Err(DomainError::InvalidToken)
        ));
    }
}
