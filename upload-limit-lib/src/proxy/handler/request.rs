use http::{Request, Response, StatusCode};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::body::ThrottledBody;
use crate::proxy::context::{RequestContext, RouteEntry};
use crate::proxy::forwarding::forward;
use crate::proxy::http_result::HttpError;
use crate::proxy::synthetic_response::{fallback_response, synthetic_error_response};

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Wrap the request body in the route's throttle, applying a per-request
/// rate override when the route names a rate header.
pub fn throttle_request(
    req: Request<Incoming>,
    entry: &RouteEntry,
    ctx: &RequestContext,
) -> Request<ThrottledBody<Incoming>> {
    let (mut parts, body) = req.into_parts();
    let mut body = ThrottledBody::with_metrics(
        body,
        entry.throttle,
        ctx.metrics.clone(),
        entry.route.prefix.clone(),
    );

    if let Some(name) = &entry.rate_header {
        if let Some(value) = parts.headers.remove(name) {
            match value.to_str() {
                Ok(rate) => {
                    if body.set_rate(rate) {
                        debug!(header = %name, rate = %body.rate(), "upload rate overridden");
                    }
                }
                Err(_) => warn!(header = %name, "ignoring non-ASCII upload rate header"),
            }
        }
    }

    Request::from_parts(parts, body)
}

fn error_response(error: HttpError, ctx: &RequestContext) -> Response<RespBody> {
    if let Some(m) = &ctx.metrics {
        m.record_error(error.error_type());
    }
    let status = StatusCode::from(error);
    synthetic_error_response(status).unwrap_or_else(|_| fallback_response(status))
}

/// Route an upload, stream its body through the throttle and relay the
/// backend's answer.
pub async fn handle_upload_request(
    req: Request<Incoming>,
    ctx: Arc<RequestContext>,
) -> Result<Response<RespBody>, hyper::Error> {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let Some(entry) = ctx.routes.find(&path) else {
        debug!(path = %path, "no route for request");
        return Ok(error_response(HttpError::NoMatchingRoute, &ctx));
    };

    let req = throttle_request(req, entry, &ctx);
    let resp = match forward(req, entry, &ctx.pool, ctx.metrics.as_ref()).await {
        Ok(resp) => resp,
        Err(e) => error_response(e, &ctx),
    };

    if let Some(m) = &ctx.metrics {
        m.record_request(
            &method,
            resp.status().as_u16(),
            &entry.route.prefix,
            start.elapsed().as_secs_f64(),
        );
    }

    Ok(resp)
}
