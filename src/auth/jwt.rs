//! Session token issuing and validation.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::UserId;
use crate::errors::{Error, Result};

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Encoded as a string; JWT `sub` is a StringOrURI.
    #[serde(with = "subject")]
    pub sub: UserId,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

mod subject {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::domain::UserId;

    pub fn serialize<S: Serializer>(id: &UserId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UserId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// HS256 signer/validator bound to one deployment's issuer and audience.
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    session_ttl: Duration,
}

impl Authenticator {
    pub fn new(secret: &[u8], issuer: &str, audience: &str, session_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            session_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            &config.issuer,
            &config.audience,
            config.session_ttl(),
        )
    }

    /// Claims for a fresh session starting now.
    pub fn claims_for(&self, user_id: UserId) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: user_id,
            iat: now,
            nbf: now,
            exp: now + self.session_ttl.as_secs() as i64,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        }
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| Error::internal_with_source("failed to sign session token", Box::new(e)))
    }

    /// Verify signature, expiry, not-before, issuer and audience.
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired",
                    ErrorKind::ImmatureSignature => "token not yet valid",
                    ErrorKind::InvalidSignature => "signature mismatch",
                    ErrorKind::InvalidIssuer => "issuer mismatch",
                    ErrorKind::InvalidAudience => "audience mismatch",
                    ErrorKind::MissingRequiredClaim(_) => "missing claim",
                    _ => "malformed token",
                };
                Error::unauthenticated(reason)
            })
    }
}
