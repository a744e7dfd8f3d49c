use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{config::SigningSecret, error::AuthError};

/// Lifetime of every issued credential.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims
///
/// The payload signed into every credential.
/// `exp` is optional on the way in: a correctly signed token without it is accepted,
/// but the issuer always sets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the principal id.
    pub sub: String,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Principal
///
/// The identity recovered from a valid credential. Built fresh for each request and
/// stored in the request extensions by the gate middleware; handlers take it as an
/// extractor argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub id: String,
    pub issued_at: i64,
    pub expires_at: Option<i64>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// TokenIssuer
///
/// Mints HS256 credentials valid for exactly `TOKEN_TTL_SECS`. Stateless: nothing is
/// stored and nothing can be revoked.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, principal_id: &str) -> jsonwebtoken::errors::Result<String> {
        self.issue_at(principal_id, Utc::now())
    }

    /// Issues a credential as if it had been minted at `issued_at`.
    pub fn issue_at(
        &self,
        principal_id: &str,
        issued_at: DateTime<Utc>,
    ) -> jsonwebtoken::errors::Result<String> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: principal_id.to_string(),
            iat,
            exp: Some(iat + TOKEN_TTL_SECS),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}

/// RequestGate
///
/// Validates bearer credentials. Holds only the read-only decoding key and validation
/// rules, so one instance is shared by every request without locking.
#[derive(Clone)]
pub struct RequestGate {
    key: DecodingKey,
    validation: Validation,
}

impl RequestGate {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The decoder's own expiry check must agree with `is_expired` to the second.
        validation.leeway = 0;
        validation.validate_exp = true;
        // `exp` is enforced only when present.
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// authenticate
    ///
    /// Runs the full check against the raw `Authorization` header value, short-circuiting
    /// on the first failure:
    /// 1. no `Bearer <token>` → `MissingCredential`
    /// 2. bad signature or shape → `InvalidCredential`
    /// 3. decoder reports expiry → `ExpiredCredential`
    /// 4. explicit `exp < now` re-check → `ExpiredCredential`
    ///
    /// With `leeway = 0` the decoder in step 3 normally rejects an expired token first, so
    /// step 4 only fires if the decoder's own check is relaxed or its clock reading
    /// differs from ours. Both paths produce the same `ExpiredCredential`.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        // 1. Extraction
        let token = bearer_token(authorization).ok_or(AuthError::MissingCredential)?;
        // 2 + 3. Signature verification and the decoder's built-in expiry check
        let claims = self.decode(token)?;

        // 4. Explicit expiry re-check
        if is_expired(claims.exp, Utc::now().timestamp()) {
            return Err(AuthError::ExpiredCredential);
        }

        // 5. Admit
        Ok(Principal::from(claims))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::InvalidCredential,
            })
    }
}

/// Pulls the token out of `Bearer <token>`. The header is split on whitespace and the
/// second piece is the token; anything else (other scheme, nothing after it) yields `None`.
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    let mut parts = authorization?.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    parts.next()
}

/// The single expiry predicate. A missing `exp` never expires.
pub fn is_expired(expires_at: Option<i64>, now: i64) -> bool {
    expires_at.is_some_and(|exp| exp < now)
}

/// Principal Extractor
///
/// Reads the principal that the gate middleware attached to the request. On a route the
/// gate does not cover there is none, and the handler is refused with
/// `MissingCredential` rather than run anonymously.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
