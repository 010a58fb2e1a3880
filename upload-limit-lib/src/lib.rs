#![forbid(unsafe_code)]

pub mod body;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod proxy;
pub mod telemetry;
pub mod throttle;

pub use body::{BodyError, ThrottledBody};
pub use config::{load_from_path, Backend, Config, Route, ThrottleConfig};
pub use error::{ProxyError, Result, ThrottleError};
pub use pipeline::{BodyFilter, ChunkOutcome};
pub use proxy::{forwarding, run};
pub use throttle::{EventStream, ThrottleContext, UploadThrottle};
