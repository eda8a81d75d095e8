//! Authentication handling for the QDS API
//!
//! Every request carries the account's API token in the `X-AUTH-TOKEN`
//! header. The token is checked when a connection is created so that a
//! missing token surfaces as a configuration error before any network I/O.

use std::collections::HashMap;
use std::fmt;

use crate::Result;

/// Header the service reads the API token from
pub const AUTH_TOKEN_HEADER: &str = "X-AUTH-TOKEN";

/// Trait for applying credentials to outgoing requests
pub trait AuthHandler: Send + Sync {
    /// Apply authentication to request headers
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()>;

    /// Validate that required credentials are available
    fn validate_credentials(&self) -> Result<()>;
}

/// API token authentication
#[derive(Clone)]
pub struct ApiTokenAuth {
    token: Option<String>,
}

impl ApiTokenAuth {
    /// Create with an explicit token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Create from an optional token; an empty string counts as missing
    pub fn from_option(token: Option<&str>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()).map(str::to_string),
        }
    }
}

// The token never appears in Debug output.
impl fmt::Debug for ApiTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiTokenAuth")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl AuthHandler for ApiTokenAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) -> Result<()> {
        match &self.token {
            Some(token) => {
                headers.insert(AUTH_TOKEN_HEADER.to_string(), token.clone());
                Ok(())
            }
            None => Err(crate::Error::configuration(
                "No API token specified. Set QDS_API_TOKEN or pass --token",
            )),
        }
    }

    fn validate_credentials(&self) -> Result<()> {
        if self.token.is_none() {
            return Err(crate::Error::configuration("API token not configured"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_header_applied() {
        let auth = ApiTokenAuth::new("secret-token");
        let mut headers = HashMap::new();

        auth.apply_auth(&mut headers).unwrap();

        assert_eq!(headers.get(AUTH_TOKEN_HEADER).unwrap(), "secret-token");
        assert!(auth.validate_credentials().is_ok());
    }

    #[test]
    fn test_missing_token() {
        let auth = ApiTokenAuth::from_option(None);
        let mut headers = HashMap::new();

        let result = auth.apply_auth(&mut headers);
        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
        assert!(headers.is_empty());
        assert!(auth.validate_credentials().is_err());
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let auth = ApiTokenAuth::from_option(Some("   "));
        assert!(auth.validate_credentials().is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let auth = ApiTokenAuth::new("secret-token");
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("***"));
    }
}
