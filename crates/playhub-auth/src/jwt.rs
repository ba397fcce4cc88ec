//! Bearer-token issuing and validation.
//!
//! Tokens are HS256-signed JWTs carrying [`Claims`]. Validation pins the
//! algorithm to HS256, the issuer to the configured string, and uses zero
//! leeway on expiry so a token is dead from its `exp` second onwards.
//!
//! # Example
//!
//! ```ignore
//! use playhub_auth::{IdentityRef, Namespace, TokenIssuer};
//! use playhub_config::JwtConfig;
//!
//! let issuer = TokenIssuer::new(JwtConfig::from_env());
//! let issued = issuer.issue(IdentityRef::new(7, Namespace::User), "p@x.com", "P", false)?;
//! let claims = issuer.validate(&issued.token)?;
//! let renewed = issuer.refresh(&issued.token, true)?;
//! ```

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use playhub_config::JwtConfig;
use playhub_core::AuthError;

use crate::claims::Claims;
use crate::namespace::IdentityRef;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// A freshly signed token together with its decoded claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Signs a new token for `identity`.
    ///
    /// The lifetime is the base expiry, or `remember_days` days when
    /// `remember` is set.
    pub fn issue(
        &self,
        identity: IdentityRef,
        email: &str,
        name: &str,
        remember: bool,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp();
        let exp = now + self.config.lifetime_seconds(remember);

        let claims = Claims {
            sub: identity.id.to_string(),
            uid: identity.id,
            ns: identity.namespace,
            email: email.to_string(),
            name: name.to_string(),
            iat: now,
            nbf: now,
            exp,
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.sign(&claims)?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::Internal(anyhow!("Token expiry out of range")))?;

        Ok(IssuedToken {
            token,
            claims,
            expires_at,
        })
    }

    /// Signs arbitrary claims with the configured secret.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(ALGORITHM),
            claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(anyhow!("Failed to sign token: {}", e)))
    }

    /// Verifies signature, algorithm, issuer and time window.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`] when the token cannot be parsed
    /// - [`AuthError::InvalidToken`] on a bad signature, unexpected algorithm or issuer
    /// - [`AuthError::ExpiredToken`] at or after `exp`
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| classify(e.kind()))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Validates `token` and mints a new one for the same identity.
    ///
    /// The new token always has a fresh `iat`/`exp` window (honoring
    /// `remember`) and a fresh `jti`; the presented token is never extended.
    pub fn refresh(&self, token: &str, remember: bool) -> Result<IssuedToken, AuthError> {
        let claims = self.validate(token)?;
        self.issue(claims.identity(), &claims.email, &claims.name, remember)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.algorithms = vec![ALGORITHM];
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedToken
        }
        _ => AuthError::InvalidToken,
    }
}
