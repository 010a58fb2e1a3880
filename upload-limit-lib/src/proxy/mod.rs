pub mod client_pool;
pub mod connection;
pub mod context;
pub mod forwarding;
pub mod handler;
pub mod http_result;
pub mod server;
pub mod synthetic_response;

pub use client_pool::ClientPool;
pub use context::{RequestContext, RouteEntry, RouteTable};
pub use forwarding::{classify_backend_error, forward, rewrite_path};
pub use http_result::HttpError;
pub use server::run;
