//! Compact HS256 bearer tokens: issue, parse, and the projections built on `parse`.
//!
//! Claims are `{sub, iat, exp}` with NumericDate values kept to millisecond precision,
//! so a TTL given in milliseconds expires exactly when configured.
//!
//! Parse order:
//! 1. blank input -> `Empty`
//! 2. segment/base64/JSON structure -> `Malformed`
//! 3. algorithm + HMAC signature -> `SignatureInvalid`
//! 4. claim shape (`sub` present and non-blank, dates readable) -> `Malformed`
//! 5. `now >= exp` -> `Expired`
//!
//! The signature is always checked before expiry, so a tampered token never reports `Expired`.
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::services::auth::secret::SigningSecret;

const HS256_SIGNATURE_LEN: usize = 32;

/// Why a token string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

/// Failures while minting a token. These are server-side problems, never client input.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("token subject must not be empty")]
    EmptySubject,
    #[error("token lifetime is out of range")]
    TtlOutOfRange,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Decoded and verified token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    #[serde(with = "numeric_date")]
    iat: DateTime<Utc>,
    #[serde(with = "numeric_date")]
    exp: DateTime<Utc>,
}

// RFC 7519 NumericDate (seconds since epoch, fractional part allowed).
mod numeric_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.timestamp_millis() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(d)?;
        if !seconds.is_finite() {
            return Err(D::Error::custom("numeric date must be finite"));
        }
        DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
            .ok_or_else(|| D::Error::custom("numeric date out of range"))
    }
}

/// Signs and verifies bearer tokens with the process-wide `SigningSecret`.
pub struct TokenCodec {
    secret: SigningSecret,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &self.secret)
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: SigningSecret) -> Self {
        // Expiry is checked here with millisecond precision, not by jsonwebtoken.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self { secret, validation }
    }

    /// Mint a token for `subject`, valid for `ttl` starting at `issued_at`.
    ///
    /// A zero `ttl` produces a token that is already expired at `issued_at`.
    pub fn generate(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, IssueError> {
        if subject.trim().is_empty() {
            return Err(IssueError::EmptySubject);
        }

        let ttl = TimeDelta::from_std(ttl).map_err(|_| IssueError::TtlOutOfRange)?;
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(IssueError::TtlOutOfRange)?;

        let claims = WireClaims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: expires_at,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        jsonwebtoken::encode(&header, &claims, self.secret.encoding_key()).map_err(|e| {
            error!(error = %e, "failed to sign token");
            IssueError::Signing(e)
        })
    }

    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        self.parse_at(token, Utc::now())
    }

    /// `parse` against an explicit clock.
    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        check_structure(token)?;

        let data = jsonwebtoken::decode::<WireClaims>(
            token,
            self.secret.decoding_key(),
            &self.validation,
        )
        .map_err(|e| {
            let kind = classify(&e);
            debug!(error = %e, kind = ?kind, "token rejected");
            kind
        })?;

        let wire = data.claims;
        if wire.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        let claims = Claims {
            subject: wire.sub,
            issued_at: wire.iat,
            expires_at: wire.exp,
        };

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.parse(token).map(|c| c.subject)
    }

    pub fn extract_expiry(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        self.parse(token).map(|c| c.expires_at)
    }

    /// `Ok(true)` for a genuine token past its expiry; any other rejection stays an error.
    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, TokenError> {
        match self.parse_at(token, now) {
            Ok(claims) => Ok(claims.is_expired_at(now)),
            Err(TokenError::Expired) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// True iff the token parses, is unexpired, and belongs to `expected_subject`.
    pub fn validate(&self, token: &str, expected_subject: &str) -> bool {
        self.validate_at(token, expected_subject, Utc::now())
    }

    pub fn validate_at(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> bool {
        self.parse_at(token, now)
            .map(|claims| claims.subject == expected_subject && !claims.is_expired_at(now))
            .unwrap_or(false)
    }
}

// Header and payload must be base64url JSON objects; the signature must be a
// canonical base64url HS256 digest. Anything wrong with the signature segment is
// reported as a signature failure.
fn check_structure(token: &str) -> Result<(), TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    for segment in [header, payload] {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| TokenError::Malformed)?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;
        if !value.is_object() {
            return Err(TokenError::Malformed);
        }
    }

    match URL_SAFE_NO_PAD.decode(signature) {
        Ok(bytes) if bytes.len() == HS256_SIGNATURE_LEN => Ok(()),
        _ => Err(TokenError::SignatureInvalid),
    }
}

fn classify(err: &jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
            TokenError::SignatureInvalid
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
