//! The accept loop: one per configured listener.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::error;

use aquae_config::ListenerBinding;

use crate::worker;

/// Bind the listener's port and accept connections forever.
pub async fn serve(binding: ListenerBinding) -> anyhow::Result<()> {
    eprintln!(
        "Coming up for Aquae requests as {} on port {}...",
        binding.node_name, binding.port
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], binding.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind port {}", binding.port))?;

    announce_ready(&binding);
    serve_on(listener, binding).await
}

/// Accept connections on an already-bound socket. Split out so tests can
/// bind an ephemeral port themselves.
pub async fn serve_on(listener: TcpListener, binding: ListenerBinding) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let binding = binding.clone();
                tokio::spawn(async move {
                    worker::run(stream, peer, binding).await;
                });
            }
            Err(e) => {
                // Accept failures affect no existing session; log and keep
                // serving.
                error!(port = binding.port, "failed to accept connection: {e}");
            }
        }
    }
}

/// The readiness line on stderr. The host comes from this listener's node
/// declaration when the metadata has one.
fn announce_ready(binding: &ListenerBinding) {
    let host = binding
        .federation
        .find_node(&binding.node_name)
        .map(|node| node.hostname().to_string())
        .unwrap_or_else(|| "localhost".to_string());
    eprintln!(" - aquae://{host}:{}/", binding.port);
}
