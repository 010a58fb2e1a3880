use http::{Request, Response, Version};
use http_body_util::{combinators::BoxBody, BodyExt};
use hyper::body::Incoming;
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::body::{BodyError, ThrottledBody};
use crate::proxy::client_pool::ClientPool;
use crate::proxy::context::RouteEntry;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::telemetry::Metrics;

type RespBody = BoxBody<bytes::Bytes, hyper::Error>;

/// Path and query as the backend should see them.
///
/// With `replace_path` set, the matched prefix is swapped for it:
/// `/upload/a.bin` under prefix `/upload` and `/v1/objects` becomes
/// `/v1/objects/a.bin`.
pub fn rewrite_path(
    path_and_query: &str,
    matched_prefix: &str,
    replace_path: Option<&str>,
) -> HttpResult<String> {
    let Some(new_path) = replace_path else {
        return Ok(path_and_query.to_string());
    };
    let Some(rest) = path_and_query.strip_prefix(matched_prefix) else {
        return Err(HttpError::InvalidUri("Path and query is broken".to_string()));
    };
    if matched_prefix.is_empty() {
        return Err(HttpError::InvalidUri("Path and query is broken".to_string()));
    }

    let mut rewritten = String::with_capacity(new_path.len().saturating_add(rest.len()));
    rewritten.push_str(new_path);
    rewritten.push_str(rest);
    Ok(rewritten)
}

/// Map a backend client failure to the error answered downstream.
///
/// A throttle failure reaches us wrapped by the client; it is an internal
/// error, not a bad gateway.
pub fn classify_backend_error(error: &(dyn StdError + 'static)) -> HttpError {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(BodyError::Throttle(e)) = err.downcast_ref::<BodyError>() {
            return HttpError::UploadThrottle(e.to_string());
        }
        current = err.source();
    }
    HttpError::BackendUnavailable(error.to_string())
}

pub async fn forward(
    req: Request<ThrottledBody<Incoming>>,
    entry: &RouteEntry,
    pool: &ClientPool,
    metrics: Option<&Arc<Metrics>>,
) -> HttpResult<Response<RespBody>> {
    let backend = entry.route.backend.as_str();

    let org_pq = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let new_pq = rewrite_path(org_pq, &entry.route.prefix, entry.route.replace_path.as_deref())?;

    let uri = format!("http://{backend}{new_pq}")
        .parse::<http::Uri>()
        .map_err(|e| HttpError::InvalidUri(e.to_string()))?;

    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    // the backend client speaks HTTP/1.1 regardless of the downstream protocol
    parts.version = Version::HTTP_11;

    debug!(backend, path = %new_pq, "forwarding upload");

    match pool.client().request(Request::from_parts(parts, body)).await {
        Ok(resp) => Ok(resp.map(|b| b.boxed())),
        Err(e) => {
            let error = classify_backend_error(&e);
            warn!(backend, error = %error, "backend request failed");
            if let (Some(m), HttpError::BackendUnavailable(_)) = (metrics, &error) {
                m.record_backend_error(backend);
            }
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ThrottleError;

    #[derive(Debug)]
    struct Wrapped(BodyError);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "client error")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn rewrite_replaces_matched_prefix() {
        let rewritten = rewrite_path("/upload/a.bin?part=2", "/upload", Some("/v1/objects"));
        assert_eq!(rewritten, Ok("/v1/objects/a.bin?part=2".to_string()));
        assert_eq!(rewrite_path("/upload/a.bin", "/upload", None), Ok("/upload/a.bin".to_string()));
    }

    #[test]
    fn rewrite_rejects_mismatched_prefix() {
        assert!(matches!(
            rewrite_path("/other", "/upload", Some("/v1")),
            Err(HttpError::InvalidUri(_))
        ));
    }

    #[test]
    fn throttle_failure_in_source_chain_is_internal() {
        let err = Wrapped(BodyError::Throttle(ThrottleError::ArmTimer("out of range".into())));
        assert!(matches!(classify_backend_error(&err), HttpError::UploadThrottle(_)));

        let err = Wrapped(BodyError::Inner("connection reset".into()));
        assert!(matches!(classify_backend_error(&err), HttpError::BackendUnavailable(_)));
    }
}
