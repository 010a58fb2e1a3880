pub mod guards;
pub mod timeout;

pub use guards::ConnectionGuard;
pub use timeout::serve_with_timeout;
