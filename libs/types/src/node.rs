//! A federation peer: where it lives and how it authenticates.

use thiserror::Error;
use url::Url;

/// Node field that failed validation.
///
/// Raised while sanitising untrusted metadata input; the loader wraps this
/// with the file and record context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeValidationError {
    #[error("invalid hostname {0:?}: must be the host component of a URI")]
    InvalidHostname(String),

    #[error("invalid port number {0}: must be in 1..=65535")]
    InvalidPort(u32),

    #[error("TLS certificate must not be empty")]
    EmptyTlsKey,
}

/// A peer in the federation.
///
/// The node name is only used to dereference the metadata graph while it is
/// being loaded; afterwards it is kept for diagnostics. Peers are identified
/// on the wire by their TLS key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    name: String,
    hostname: String,
    port: u16,
    tls_key: Vec<u8>,
}

impl Node {
    /// Build a node from untrusted metadata input.
    ///
    /// The hostname must parse as the host component of a URI and round-trip
    /// equal to the input; the port must be non-zero and fit 16 bits; the
    /// TLS key must be non-empty. The name may be any UTF-8 string.
    pub fn new(
        name: impl Into<String>,
        hostname: impl Into<String>,
        port: u32,
        tls_key: Vec<u8>,
    ) -> Result<Self, NodeValidationError> {
        let hostname = hostname.into();
        let parsed = Url::parse(&format!("https://{hostname}"))
            .map_err(|_| NodeValidationError::InvalidHostname(hostname.clone()))?;
        if parsed.host_str() != Some(hostname.as_str()) {
            return Err(NodeValidationError::InvalidHostname(hostname));
        }

        // Port 0 is not addressable for outgoing connections.
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(NodeValidationError::InvalidPort(port))?;

        if tls_key.is_empty() {
            return Err(NodeValidationError::EmptyTlsKey);
        }

        Ok(Self {
            name: name.into(),
            hostname,
            port,
            tls_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tls_key(&self) -> &[u8] {
        &self.tls_key
    }

    /// The `aquae://` endpoint this node answers on.
    pub fn endpoint(&self) -> String {
        format!("aquae://{}:{}/", self.hostname, self.port)
    }
}
