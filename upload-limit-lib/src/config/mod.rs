mod backend;
mod loader;
mod root;
mod size;
mod telemetry;
mod timeout;
mod upload_limit;

pub use backend::{Backend, BackendPoolConfig, Route};
pub use loader::{load_from_path, load_from_str};
pub use root::Config;
pub use size::{parse_size, ByteSize};
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::TimeoutConfig;
pub use upload_limit::{resolve, ThrottleConfig, ThrottleLogLevel, UploadLimitSettings};
