// CellDock host daemon: hub session, protocol dispatch, inspection bridge.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use celldock_core::StorageRack;
use celldock_host::{config, handler, link, session, vision};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("celldock-host {}", VERSION);
            return Ok(());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load();
    tracing::info!(hub = %cfg.hub_target, "starting");

    let frame_cell = Arc::new(vision::FrameCell::new());
    // No classifier is wired in by default: the daemon then runs in the
    // degraded mode where inspections go unanswered and the hub's poll
    // times out into the acceptable branch. A deployment registers its
    // capture source and classifier against `frame_cell`/`inspector`.
    let inspector = Arc::new(vision::InspectionService::new(
        frame_cell,
        None,
        cfg.dirty_confidence,
    ));
    let (to_hub_tx, to_hub_rx) = mpsc::unbounded_channel();
    let handler = Arc::new(handler::ProtocolHandler::new(
        inspector,
        Box::new(LogPresentation),
        to_hub_tx,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let session_task = tokio::spawn(session::run_session(
            link::TcpLink,
            cfg.hub_target.clone(),
            cfg.retry_backoff(),
            handler,
            to_hub_rx,
            shutdown_rx,
        ));
        shutdown_signal().await?;
        tracing::info!("shutting down");
        let _ = shutdown_tx.send(true);
        let _ = session_task.await;
        Ok::<(), anyhow::Error>(())
    })?;
    Ok(())
}

/// Presentation collaborator used when none is wired in: log the snapshot.
struct LogPresentation;

impl vision::PresentationSink for LogPresentation {
    fn push(&self, rack: &StorageRack) {
        if let Ok(json) = rack.to_json() {
            tracing::info!(%json, "rack snapshot");
        }
    }
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
