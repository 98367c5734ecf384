//! HS256 JSON Web Token implementation of the `TokenService` port.
//!
//! Claims are `sub` (user id), `iat` and `exp` in Unix seconds. Expiry is
//! checked against the caller's clock rather than the system time, so the
//! library's own `exp` validation is disabled.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::UserId;
use crate::domain::ports::{IssuedToken, TokenError, TokenService};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies bearer tokens with a shared secret.
pub struct JwtTokenService {
    secret: Zeroizing<Vec<u8>>,
    ttl: TimeDelta,
}

impl JwtTokenService {
    /// Create a service issuing tokens valid for `ttl`.
    pub fn new(secret: &str, ttl: TimeDelta) -> Self {
        Self {
            secret: Zeroizing::new(secret.as_bytes().to_vec()),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Self::validation(),
        )
        .map_err(|err| match err.kind() {
            ErrorKind::InvalidSignature => TokenError::invalid("signature mismatch"),
            _ => TokenError::invalid(err.to_string()),
        })?;
        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::expired());
        }
        UserId::new(&data.claims.sub).map_err(|err| TokenError::invalid(err.to_string()))
    }
}
