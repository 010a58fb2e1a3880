use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;

use crate::body::ThrottledBody;
use crate::config::{BackendPoolConfig, TimeoutConfig};

pub type HttpClient = Client<HttpConnector, ThrottledBody<Incoming>>;

/// Shared HTTP/1.1 client for backend connections
///
/// Uploads are streamed to the backend as the throttle releases them, so a
/// pooled connection stays busy for as long as the slowest body on it.
#[derive(Clone)]
pub struct ClientPool {
    client: Arc<HttpClient>,
}

impl ClientPool {
    pub fn new(timeout: &TimeoutConfig, config: &BackendPoolConfig) -> Self {
        let mut connector = HttpConnector::new();
        // TCP keep-alive: sends periodic packets to keep TCP connection alive
        if timeout.keep_alive_secs > 0 {
            connector.set_keepalive(Some(Duration::from_secs(timeout.keep_alive_secs)));
        } else {
            connector.set_keepalive(None);
        }

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_idle_timeout(Duration::from_secs(config.idle_timeout));

        if config.pool_max_idle_per_host > 0 {
            builder.pool_max_idle_per_host(config.pool_max_idle_per_host);
        }

        Self { client: Arc::new(builder.build(connector)) }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}
