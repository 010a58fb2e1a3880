use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{ProxyError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ProxyError::Config(format!("Failed to read config file: {e}")))?;
    load_from_str(&txt)
}

pub fn load_from_str(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)
        .map_err(|e| ProxyError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.backends.is_empty() {
        return Err(ProxyError::NoBackends);
    }

    if cfg.backends.iter().any(|b| b.address.trim().is_empty()) {
        return Err(ProxyError::Config("backend address cannot be empty".to_string()));
    }

    let backend_addresses: HashSet<_> = cfg.backends.iter().map(|b| b.address.as_str()).collect();

    for route in &cfg.routes {
        if route.prefix.is_empty() {
            return Err(ProxyError::Config("route prefix cannot be empty".to_string()));
        }
        if !backend_addresses.contains(route.backend.as_str()) {
            return Err(ProxyError::Config(format!(
                "Route references unknown backend: {}",
                route.backend
            )));
        }
        if let Some(header) = &route.rate_header {
            if http::HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(ProxyError::Config(format!(
                    "Route {} has invalid rate_header: {header}",
                    route.prefix
                )));
            }
        }
    }

    Ok(())
}
