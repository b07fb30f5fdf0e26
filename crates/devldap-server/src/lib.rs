//! devldap-server: the LDAP endpoint.
//!
//! Decodes BER messages with `ldap3_proto`, hands them to the
//! [`Router`](devldap_core::Router) and writes the responses back.
//! [`run`] is the whole `devldap serve` lifecycle: load, watch, listen,
//! stop on Ctrl-C.

pub mod convert;
pub mod server;

pub use server::Server;

use anyhow::Context as _;
use devldap_core::{Config, DirectoryHandle, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the server until SIGINT/SIGTERM. Blocks the calling thread.
pub fn run(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run_async(config))
}

async fn run_async(config: Config) -> anyhow::Result<()> {
    let directory = devldap_data::load_file_async(&config.data.path).await?;
    info!(
        path = %config.data.path.display(),
        entries = directory.len(),
        "directory loaded"
    );
    let handle = DirectoryHandle::new(directory);
    let shutdown = CancellationToken::new();

    let watcher = if config.data.watch {
        Some(devldap_data::spawn_watcher(
            config.data.path.clone(),
            handle.clone(),
            Duration::from_millis(config.data.debounce_ms),
            shutdown.child_token(),
        )?)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to listen on {}", config.server.listen))?;
    let server = Server::new(Router::standard(&config), handle);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        signal_token.cancel();
    });

    server.serve(listener, shutdown.clone()).await?;
    shutdown.cancel();
    if let Some(watcher) = watcher {
        watcher.await?;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
