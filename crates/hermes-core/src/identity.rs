//! The identity carrier.
//!
//! Upstream authentication middleware resolves the caller's credential into
//! an [`AuthInfo`] and attaches it to the request's extensions before the
//! dispatcher runs. The dispatcher reads it from there and hands it to the
//! handler; nothing downstream can change it.

use std::fmt;

use bytes::Bytes;
use http::Extensions;

/// The caller's credential, opaque to the dispatch core.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthInfo {
    /// Bearer token as presented by the client.
    pub token: String,
    /// Client certificate, when the caller authenticated with one.
    pub cert_data: Option<Bytes>,
}

impl AuthInfo {
    /// Identity from a bearer token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            cert_data: None,
        }
    }

    /// Identity from a client certificate.
    pub fn from_cert(cert_data: impl Into<Bytes>) -> Self {
        Self {
            token: String::new(),
            cert_data: Some(cert_data.into()),
        }
    }

    /// Attaches the identity to request extensions.
    ///
    /// Identity is set once per request. If one is already attached it is
    /// kept and `self` is handed back.
    pub fn attach(self, extensions: &mut Extensions) -> Result<(), Self> {
        if extensions.get::<Self>().is_some() {
            return Err(self);
        }
        extensions.insert(self);
        Ok(())
    }

    /// Reads the identity from request extensions.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Option<&Self> {
        extensions.get::<Self>()
    }
}

impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo")
            .field("token", &if self.token.is_empty() { "" } else { "[REDACTED]" })
            .field("cert_data", &self.cert_data.as_ref().map(Bytes::len))
            .finish()
    }
}
