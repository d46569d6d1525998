//! Session identity and credential types.

use core::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Role reported by the identity service.
///
/// Only `ADMIN` grants administrative UI. Any other value, including the
/// legacy `USER`, is a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("ADMIN") {
            Self::Admin
        } else {
            Self::Customer
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

/// The authenticated user of the current browsing session.
///
/// The token is opaque: it is stored and forwarded, never interpreted.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub token: SecretString,
    /// Token lifetime reported at issue time, in milliseconds.
    pub expires_in_ms: Option<i64>,
}

impl SessionIdentity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

impl Registration {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}
