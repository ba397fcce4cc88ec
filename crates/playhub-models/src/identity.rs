//! Identity models.
//!
//! Administrators and standard users share a shape but live in separate
//! tables. The namespace is not a column; it is attached when a row is read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use playhub_auth::{IdentityRef, Namespace};

/// An identity row with its password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub namespace: Namespace,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn identity_ref(&self) -> IdentityRef {
        IdentityRef::new(self.id, self.namespace)
    }

    pub fn view(&self) -> IdentityView {
        IdentityView {
            id: self.id,
            namespace: self.namespace,
            email: self.email.clone(),
            name: self.name.clone(),
            last_login_at: self.last_login_at,
        }
    }
}

/// Public projection of an identity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IdentityView {
    pub id: i64,
    pub namespace: Namespace,
    pub email: String,
    pub name: String,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating an identity (CLI and test fixtures).
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub namespace: Namespace,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_omits_password_hash() {
        let identity = Identity {
            id: 9,
            namespace: Namespace::Admin,
            email: "ops@playhub.gg".to_string(),
            name: "Ops".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            last_login_at: None,
            created_at: Utc::now(),
        };
        let serialized = serde_json::to_string(&identity.view()).unwrap();
        assert!(serialized.contains(r#""namespace":"admin""#));
        assert!(!serialized.contains("secret"));
        assert_eq!(identity.identity_ref(), IdentityRef::new(9, Namespace::Admin));
    }
}
