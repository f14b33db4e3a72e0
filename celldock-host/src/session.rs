//! Broadcast session manager: one long-lived task owning the hub link
//! lifecycle (discover, connect, subscribe, monitor), retried forever
//! with a fixed backoff and reconnected on disconnect. Link failures
//! never escalate to process termination.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::handler::ProtocolHandler;
use crate::link::{LinkConnection, LinkTransport};

/// Discovery window per attempt.
pub const DISCOVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the session loop until shutdown. `backoff` is the fixed delay
/// between failed attempts; a lost connection reconnects immediately.
/// Shutdown is observed at every sleep and await point.
pub async fn run_session<T: LinkTransport>(
    mut transport: T,
    target: String,
    backoff: Duration,
    handler: Arc<ProtocolHandler>,
    mut to_hub: mpsc::UnboundedReceiver<Vec<u8>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        match transport.connect(&target, DISCOVER_TIMEOUT).await {
            Ok(Some(conn)) => {
                tracing::info!(hub = %target, "hub link up");
                let finished = serve(conn, &handler, &mut to_hub, &mut shutdown).await;
                if finished {
                    return;
                }
                tracing::warn!("hub link lost, reconnecting");
            }
            Ok(None) => {
                tracing::info!(hub = %target, "hub not found, retrying");
                if sleep_or_shutdown(backoff, &mut shutdown).await {
                    return;
                }
            }
            Err(err) => {
                tracing::warn!("link error: {err}, retrying");
                if sleep_or_shutdown(backoff, &mut shutdown).await {
                    return;
                }
            }
        }
    }
}

/// Serve one connection. Returns true on shutdown, false on disconnect.
async fn serve<C: LinkConnection>(
    mut conn: C,
    handler: &ProtocolHandler,
    to_hub: &mut mpsc::UnboundedReceiver<Vec<u8>>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
            outbound = to_hub.recv() => {
                let Some(bytes) = outbound else { return true };
                if let Err(err) = conn.write(&bytes).await {
                    tracing::warn!("link write failed: {err}");
                    return false;
                }
            }
            notification = conn.next_notification() => {
                match notification {
                    Ok(Some(bytes)) => handler.on_bytes(&bytes),
                    Ok(None) => return false,
                    Err(err) => {
                        tracing::warn!("link read failed: {err}");
                        return false;
                    }
                }
            }
        }
    }
}

/// Sleep, but wake for shutdown. Returns true if shutdown fired.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
