//! Credentials attached to outgoing GData requests.
//!
//! Obtaining the tokens (ClientLogin, AuthSub) happens elsewhere; this module only knows how
//! to present them.

use http::HeaderValue;
use http::header::InvalidHeaderValue;
use std::fmt;

/// A token the GData API accepts in the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// The `Auth` value returned by a ClientLogin exchange.
    ClientLogin { auth: String },
    /// A (single-use or session) AuthSub token.
    AuthSub { token: String },
}

impl Credentials {
    pub fn client_login(auth: impl Into<String>) -> Self {
        Self::ClientLogin { auth: auth.into() }
    }

    pub fn auth_sub(token: impl Into<String>) -> Self {
        Self::AuthSub {
            token: token.into(),
        }
    }

    /// The value of the `Authorization` header for these credentials.
    pub fn authorization(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let value = match self {
            Self::ClientLogin { auth } => format!("GoogleLogin auth={auth}"),
            Self::AuthSub { token } => format!("AuthSub token={token}"),
        };
        let mut value = HeaderValue::from_str(&value)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

// tokens must never end up in logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientLogin { .. } => f.write_str("ClientLogin(..)"),
            Self::AuthSub { .. } => f.write_str("AuthSub(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn authorization_header_per_scheme() {
        let login = Credentials::client_login("abc123");
        assert_eq!(login.authorization().unwrap(), "GoogleLogin auth=abc123");

        let authsub = Credentials::auth_sub("tok");
        assert_eq!(authsub.authorization().unwrap(), "AuthSub token=tok");
        assert!(authsub.authorization().unwrap().is_sensitive());
    }

    #[test]
    fn debug_hides_token() {
        let login = Credentials::client_login("secret");
        assert!(!format!("{login:?}").contains("secret"));
    }

    #[test]
    fn rejects_header_breaking_tokens() {
        assert!(Credentials::auth_sub("a\nb").authorization().is_err());
    }
}
