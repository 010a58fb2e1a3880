use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::proxy::connection::{serve_with_timeout, ConnectionGuard};
use crate::proxy::context::RequestContext;
use crate::proxy::handler::handle_upload_request;
use crate::telemetry::Metrics;

/// Accept connections until `shutdown` flips, then wait for in-flight
/// uploads to drain.
pub async fn run(
    config: Arc<Config>,
    metrics: Option<Arc<Metrics>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = config.listen;
    let listener = TcpListener::bind(addr).await.map_err(ProxyError::Io)?;

    let builder = ConnBuilder::new(TokioExecutor::new());
    let ctx = Arc::new(RequestContext::new(&config, metrics));
    let connection_timeout = Duration::from_secs(config.timeout.connection_handling_secs);

    // Track active connections for graceful shutdown
    let active_connections = Arc::new(AtomicUsize::new(0));

    info!(?addr, routes = ctx.routes.len(), "starting upload proxy (h1/h2)");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                let guard = ConnectionGuard::new(active_connections.clone());
                let builder = builder.clone();
                let ctx = ctx.clone();

                tokio::spawn(async move {
                    let _guard = guard;
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        handle_upload_request(req, ctx.clone())
                    });

                    serve_with_timeout(
                        builder.serve_connection(TokioIo::new(stream), svc),
                        connection_timeout,
                        peer,
                    )
                    .await;
                });
            }
        }
    }

    info!(
        "Waiting for active connections to finish (timeout: {}s)",
        config.timeout.shutdown_secs
    );
    let shutdown_timeout = Duration::from_secs(config.timeout.shutdown_secs);
    let start = std::time::Instant::now();

    loop {
        let active = active_connections.load(Ordering::Relaxed);
        if active == 0 {
            info!("All connections closed, shutdown complete");
            break;
        }

        if start.elapsed() >= shutdown_timeout {
            warn!(
                active_connections = active,
                "Shutdown timeout reached, connections still active"
            );
            break;
        }

        sleep(Duration::from_millis(100)).await;
    }

    info!("Upload proxy stopped");
    Ok(())
}
