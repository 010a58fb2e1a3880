use http::HeaderName;
use std::sync::Arc;

use crate::config::{Config, Route, ThrottleConfig};
use crate::proxy::client_pool::ClientPool;
use crate::telemetry::Metrics;

/// A route with its upload limit already resolved against the global table
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub route: Route,
    pub throttle: ThrottleConfig,
    pub rate_header: Option<HeaderName>,
}

/// Routes in match order, first prefix match wins
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn from_config(config: &Config) -> Self {
        let entries = config
            .routes
            .iter()
            .map(|route| RouteEntry {
                route: route.clone(),
                throttle: config.throttle_for(route),
                // validated at load time
                rate_header: route
                    .rate_header
                    .as_deref()
                    .and_then(|h| HeaderName::from_bytes(h.as_bytes()).ok()),
            })
            .collect();
        Self { entries }
    }

    pub fn find(&self, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .find(|e| path.starts_with(&e.route.prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared state for every request handled by the proxy
pub struct RequestContext {
    pub routes: RouteTable,
    pub pool: ClientPool,
    pub metrics: Option<Arc<Metrics>>,
}

impl RequestContext {
    pub fn new(config: &Config, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            routes: RouteTable::from_config(config),
            pool: ClientPool::new(&config.timeout, &config.backend_pool),
            metrics,
        }
    }
}
