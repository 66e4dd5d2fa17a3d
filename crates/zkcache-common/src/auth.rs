//! Authentication for the zkcache client.
//!
//! The zkcache proxy optionally requires a CRAM-MD5 challenge–response
//! handshake before serving reads. The client asks the server for a fresh
//! challenge, then proves knowledge of the shared password by returning
//! `username + " " + hex(HMAC-MD5(key=password, message=challenge))`.
//!
//! Authentication is optional and configured per client:
//! - **No authentication**: the client connects to the plain route and
//!   performs no handshake (default)
//! - **CRAM-MD5**: the client connects to the authenticated route and must
//!   complete the handshake before the first read
//!
//! # Example
//!
//! ```
//! use zkcache_common::auth::AuthConfig;
//!
//! // A client with credentials
//! let auth = AuthConfig::with_credentials("reader", "hunter2");
//! assert!(auth.requires_auth());
//!
//! // A client without
//! let no_auth = AuthConfig::disabled();
//! assert!(!no_auth.requires_auth());
//! ```

use std::fmt;

use hmac::{Hmac, Mac};
use md5::Md5;

use crate::protocol::error::{Result, ZkCacheError};

type HmacMd5 = Hmac<Md5>;

/// A username/password pair for the CRAM-MD5 handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Authentication configuration for a zkcache client.
///
/// Both halves of the credential pair must be supplied together; the
/// constructors enforce this so that a partially-configured client cannot
/// exist.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    credentials: Option<Credentials>,
}

impl AuthConfig {
    /// Creates a config with CRAM-MD5 authentication enabled.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Creates a config with authentication disabled.
    pub fn disabled() -> Self {
        Self { credentials: None }
    }

    /// Builds a config from optional username/password halves, enforcing
    /// that either both or neither are present.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if exactly one half is supplied.
    ///
    /// # Example
    ///
    /// ```
    /// use zkcache_common::auth::AuthConfig;
    ///
    /// assert!(AuthConfig::from_parts(None, None).is_ok());
    /// assert!(AuthConfig::from_parts(Some("reader".into()), Some("pw".into())).is_ok());
    /// assert!(AuthConfig::from_parts(Some("reader".into()), None).is_err());
    /// ```
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Result<Self> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Self::with_credentials(username, password)),
            (None, None) => Ok(Self::disabled()),
            _ => Err(ZkCacheError::Config(
                "You must provide either both or none of username and password".to_string(),
            )),
        }
    }

    /// Whether a handshake is required on dial.
    pub fn requires_auth(&self) -> bool {
        self.credentials.is_some()
    }

    /// The configured credentials, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

impl fmt::Display for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.credentials {
            Some(creds) => write!(f, "CramMd5({}, *****)", creds.username),
            None => write!(f, "Disabled"),
        }
    }
}

/// Computes the CRAM-MD5 proof for a server challenge.
///
/// The proof is the username, a single space, and the lowercase hex digest
/// of HMAC-MD5 keyed with the password over the challenge bytes.
pub fn cram_md5_proof(username: &str, password: &str, challenge: &str) -> String {
    let mut mac =
        HmacMd5::new_from_slice(password.as_bytes()).expect("HMAC accepts any key length");
    mac.update(challenge.as_bytes());
    let digest = mac.finalize().into_bytes();
    format!("{} {}", username, hex::encode(digest))
}
