//! # Aquae Daemon Configuration
//!
//! The daemon configuration names the ports this node listens on and, for
//! each port, which identity it serves as, which metadata file describes
//! the federation, and optionally which queries it offers:
//!
//! ```toml
//! [[listener]]
//! node_name = "school"
//! port = 7411
//! metadata_file = "federation.meta"
//! query = ["bb?"]
//! ```
//!
//! [`DaemonConfig::load`] parses the file; [`DaemonConfig::resolve`] loads
//! every referenced metadata file (identical canonicalised paths are loaded
//! once and shared) and produces one [`ListenerBinding`] per listener. All
//! validation failures are fatal before any listener is opened; the softer
//! cross-checks against the snapshot — does the node name resolve, does the
//! declared port match, do the offered queries exist — warn and continue.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use aquae_metadata::MetadataError;
use aquae_types::Federation;

/// Configuration failure. All variants are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("listener {index} in {file} has invalid port number 0")]
    InvalidPort { file: String, index: usize },

    #[error("listener {index} in {file} has an empty node_name")]
    EmptyNodeName { file: String, index: usize },

    #[error("failed to canonicalise metadata path {path}: {source}")]
    BadMetadataPath {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// One `[[listener]]` table from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    pub node_name: String,
    /// Port to listen on. A `u16` on the wire; zero is rejected during
    /// validation and anything above 65535 fails TOML deserialisation.
    pub port: u16,
    pub metadata_file: PathBuf,
    /// Query names offered on this listener.
    #[serde(default)]
    pub query: Vec<String>,
}

/// The parsed daemon configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub listener: Vec<ListenerConfig>,
}

/// A listener with its federation snapshot attached: everything an accept
/// loop needs.
#[derive(Debug, Clone)]
pub struct ListenerBinding {
    pub node_name: String,
    pub port: u16,
    pub federation: Arc<Federation>,
    pub queries: Vec<String>,
}

impl DaemonConfig {
    /// Parse the configuration file. Structural problems (missing required
    /// fields, out-of-range ports, malformed TOML) are fatal here.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref().display().to_string();
        info!(%file, "reading daemon configuration");

        let contents = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            file: file.clone(),
            source,
        })?;
        let config: DaemonConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                file: file.clone(),
                source,
            })?;

        config.validate(&file)?;
        Ok(config)
    }

    fn validate(&self, file: &str) -> Result<(), ConfigError> {
        for (index, listener) in self.listener.iter().enumerate() {
            if listener.node_name.is_empty() {
                return Err(ConfigError::EmptyNodeName {
                    file: file.to_string(),
                    index,
                });
            }
            if listener.port == 0 {
                return Err(ConfigError::InvalidPort {
                    file: file.to_string(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// Load every referenced metadata file and bind listeners to their
    /// snapshots. Listeners naming the same canonical metadata path share
    /// one snapshot.
    pub fn resolve(&self) -> Result<Vec<ListenerBinding>, ConfigError> {
        let mut snapshots: HashMap<PathBuf, Arc<Federation>> = HashMap::new();
        let mut bindings = Vec::with_capacity(self.listener.len());

        for listener in &self.listener {
            let canonical = listener.metadata_file.canonicalize().map_err(|source| {
                ConfigError::BadMetadataPath {
                    path: listener.metadata_file.display().to_string(),
                    source,
                }
            })?;

            let federation = match snapshots.get(&canonical) {
                Some(existing) => Arc::clone(existing),
                None => {
                    let snapshot = Arc::new(aquae_metadata::load(&canonical)?);
                    snapshots.insert(canonical.clone(), Arc::clone(&snapshot));
                    snapshot
                }
            };

            cross_check(listener, &federation);

            bindings.push(ListenerBinding {
                node_name: listener.node_name.clone(),
                port: listener.port,
                federation,
                queries: listener.query.clone(),
            });
        }

        debug!(
            listeners = bindings.len(),
            snapshots = snapshots.len(),
            "configuration resolved"
        );
        Ok(bindings)
    }
}

/// Warn-level consistency checks between a listener and its snapshot.
/// Deployments routinely run ahead of federation metadata, so none of these
/// stop startup.
fn cross_check(listener: &ListenerConfig, federation: &Federation) {
    match federation.find_node(&listener.node_name) {
        None => warn!(
            node_name = %listener.node_name,
            metadata = federation.origin(),
            "listener's node name is not declared in its federation metadata"
        ),
        Some(node) => {
            if node.port() != listener.port {
                warn!(
                    node_name = %listener.node_name,
                    declared = node.port(),
                    configured = listener.port,
                    "listener port differs from the node's declared port"
                );
            }
        }
    }

    for query in &listener.query {
        if federation.find_query(query).is_none() {
            warn!(
                node_name = %listener.node_name,
                query = %query,
                metadata = federation.origin(),
                "offered query is not declared in the federation metadata"
            );
        }
    }
}
