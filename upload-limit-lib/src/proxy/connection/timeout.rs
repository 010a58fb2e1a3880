use std::net::SocketAddr;
use tracing::warn;

/// Serve a connection, giving up once `timeout_duration` has passed.
///
/// Throttled uploads keep a connection open for as long as the body takes at
/// its configured rate, so the limit must be generous.
pub async fn serve_with_timeout<F, E>(
    serve_fut: F,
    timeout_duration: tokio::time::Duration,
    peer: SocketAddr,
) where
    F: std::future::Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(timeout_duration, serve_fut).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(?peer, error = %e, "serve_connection error");
        }
        Err(_) => {
            warn!(?peer, "connection handling timeout");
        }
    }
}
