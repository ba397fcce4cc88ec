//! Identity namespaces.
//!
//! Administrators and standard users live in separate tables and never share an
//! id space, so an identity is only meaningful as the pair `(namespace, id)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Admin,
    User,
}

impl Namespace {
    /// Order in which login and password reset probe the namespaces.
    pub const PROBE_ORDER: [Namespace; 2] = [Namespace::User, Namespace::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Admin => "admin",
            Namespace::User => "user",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown identity namespace: {0}")]
pub struct UnknownNamespace(pub String);

impl FromStr for Namespace {
    type Err = UnknownNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Namespace::Admin),
            "user" => Ok(Namespace::User),
            other => Err(UnknownNamespace(other.to_string())),
        }
    }
}

impl TryFrom<String> for Namespace {
    type Error = UnknownNamespace;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A resolved identity: which table, which row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct IdentityRef {
    pub id: i64,
    pub namespace: Namespace,
}

impl IdentityRef {
    pub fn new(id: i64, namespace: Namespace) -> Self {
        Self { id, namespace }
    }
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}
