//! The per-connection worker.
//!
//! Each accepted connection is owned by exactly one worker for its
//! lifetime. Workers share nothing mutable: the federation snapshot is
//! read-only and the transport session is private, so there is no locking
//! anywhere on this path. A worker that fails takes only its own session
//! with it.

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use aquae_config::ListenerBinding;
use aquae_transport::{Session, TransportResult};
use aquae_types::{IdentitySignRequest, MsgType};

/// Drive one connection until the peer finishes, the stream fails, or a
/// protocol error tears the session down.
pub async fn run(stream: TcpStream, peer: SocketAddr, binding: ListenerBinding) {
    debug!(%peer, node_name = %binding.node_name, "new worker");

    let mut session = Session::new(stream);
    match serve(&mut session, peer, &binding).await {
        Ok(()) => debug!(%peer, "session finished cleanly"),
        Err(err) if err.is_misuse() => {
            // A bug in this worker, never peer input. Fail this worker
            // fast; the listener and every other session are unaffected.
            error!(%peer, "worker invariant violated: {err}");
        }
        Err(err) => warn!(%peer, "closing session: {err}"),
    }
    // Dropping the session closes the connection and frees its buffers.
}

async fn serve(
    session: &mut Session<TcpStream>,
    peer: SocketAddr,
    binding: &ListenerBinding,
) -> TransportResult<()> {
    loop {
        let msg_type = session.read_frame().await?;
        match msg_type {
            MsgType::IdentitySignRequest => {
                let request = session.read_identity_sign_request().await?;
                handle_identity_sign_request(peer, binding, &request);
            }
            MsgType::SignedQuery => {
                let query = session.read_signed_query().await?;
                // Decoding the signed envelope and planning the query are
                // the query layer's job.
                info!(%peer, bytes = query.payload.len(), "received signed query");
            }
            MsgType::Finish => {
                session.read_opaque_body(MsgType::Finish).await?;
                info!(%peer, "peer finished the session");
                return Ok(());
            }
            other => {
                let body = session.read_opaque_body(other).await?;
                debug!(
                    %peer,
                    msg_type = ?other,
                    bytes = body.len(),
                    "message type has no handler yet"
                );
            }
        }
    }
}

/// Resolve the request's identity-set nodes against this listener's
/// snapshot. Signing itself belongs to the identity bridge.
fn handle_identity_sign_request(
    peer: SocketAddr,
    binding: &ListenerBinding,
    request: &IdentitySignRequest,
) {
    for name in &request.identity_set_nodes {
        match binding.federation.find_node(name) {
            Some(node) => {
                debug!(%peer, node = %name, endpoint = %node.endpoint(), "identity set node resolved")
            }
            None => warn!(%peer, node = %name, "identity set names an undeclared node"),
        }
    }

    info!(
        %peer,
        identity_set_nodes = request.identity_set_nodes.len(),
        has_subject = request.subject.is_some(),
        "received identity sign request"
    );
}
