//! JWT token utilities for authentication and authorization.
//!
//! Provides token issuance (access and refresh lifetimes) and signature/expiry
//! verification. Keys, algorithm, lifetimes and the clock are injected at
//! construction; nothing is read from the environment here.

use crate::auth::errors::UnauthenticatedReason;
use crate::config::AuthSettings;
use crate::errors::{ServiceError, ServiceResult};
use crate::utils::clock::{Clock, SystemClock};
use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Claim names computed by the issuer; caller-supplied values are discarded.
const RESERVED_CLAIMS: [&str; 2] = ["exp", "iat"];

/// Caller-supplied claims for a new token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id rendered as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Any additional claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Claims carrying only a subject.
    pub fn for_subject(sub: impl ToString) -> Self {
        Self {
            sub: Some(sub.to_string()),
            extra: Map::new(),
        }
    }

    /// Adds an extension claim.
    #[cfg(test)]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Builds claims from an untyped JSON value.
    ///
    /// # Errors
    /// Returns a validation error unless `value` is a JSON object whose `sub`,
    /// if present, is a string.
    #[cfg(test)]
    pub fn from_value(value: Value) -> ServiceResult<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ServiceError::validation(format!(
                    "Token claims must be a JSON object, got {}",
                    json_kind(&other)
                )));
            }
        };

        let sub = match map.remove("sub") {
            None | Some(Value::Null) => None,
            Some(Value::String(sub)) => Some(sub),
            Some(other) => {
                return Err(ServiceError::validation(format!(
                    "Token claim 'sub' must be a string, got {}",
                    json_kind(&other)
                )));
            }
        };

        for reserved in RESERVED_CLAIMS {
            map.remove(reserved);
        }

        Ok(Self { sub, extra: map })
    }
}

#[cfg(test)]
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The full, signed claim set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration timestamp (UNIX seconds, UTC)
    pub exp: i64,
    /// Issued-at timestamp (UNIX seconds, UTC)
    #[serde(default)]
    pub iat: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JWT token utility for creating and validating tokens
pub struct JwtUtils {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtUtils {
    /// Create a new JwtUtils instance backed by the wall clock
    pub fn new(settings: &AuthSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a new JwtUtils instance with an explicit clock
    pub fn with_clock(settings: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret_key.as_bytes());

        // Expiry is checked against the injected clock after decoding.
        let mut validation = Validation::new(settings.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        JwtUtils {
            header: Header::new(settings.algorithm),
            encoding_key,
            decoding_key,
            validation,
            access_token_ttl: settings.access_token_ttl,
            refresh_token_ttl: settings.refresh_token_ttl,
            clock,
        }
    }

    /// Default lifetime of access tokens
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Default lifetime of refresh tokens
    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    /// Generate an access token, expiring after `ttl_override` or the configured lifetime
    pub fn issue_access_token(
        &self,
        claims: Claims,
        ttl_override: Option<Duration>,
    ) -> ServiceResult<String> {
        self.issue(claims, ttl_override.unwrap_or(self.access_token_ttl))
    }

    /// Generate a refresh token (longer expiration)
    pub fn issue_refresh_token(&self, claims: Claims) -> ServiceResult<String> {
        self.issue(claims, self.refresh_token_ttl)
    }

    fn issue(&self, claims: Claims, ttl: Duration) -> ServiceResult<String> {
        let now = self.clock.now();
        let exp = now + ttl;

        let mut extra = claims.extra;
        extra.remove("sub");
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }

        let token_claims = TokenClaims {
            sub: claims.sub,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            extra,
        };

        encode(&self.header, &token_claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Verify the signature and expiry of a token and return its claims.
    ///
    /// The signature is checked first, so a correctly signed but expired token
    /// reports `Expired`, and anything unverifiable reports `InvalidSignature`.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, UnauthenticatedReason> {
        decode_header(token).map_err(|_| UnauthenticatedReason::InvalidSignature)?;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => {
                    UnauthenticatedReason::MalformedClaims
                }
                _ => UnauthenticatedReason::InvalidSignature,
            })?;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(UnauthenticatedReason::Expired);
        }

        Ok(claims)
    }
}
