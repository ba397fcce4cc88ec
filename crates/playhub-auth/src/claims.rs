//! Bearer-token claim structure.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::namespace::{IdentityRef, Namespace};

/// Claims embedded in every bearer token.
///
/// `sub` and `uid` carry the same identity id (string and numeric form); `ns`
/// says which table it belongs to. `jti` is random per token so two tokens
/// minted for the same identity in the same second still differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Identity id (subject claim)
    pub sub: String,
    /// Identity id, numeric
    pub uid: i64,
    /// Identity namespace
    pub ns: Namespace,
    pub email: String,
    /// Display name
    pub name: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Not-before (Unix timestamp)
    pub nbf: i64,
    /// Expiry (Unix timestamp)
    pub exp: i64,
    /// Fixed issuer string
    pub iss: String,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> IdentityRef {
        IdentityRef::new(self.uid, self.ns)
    }
}
