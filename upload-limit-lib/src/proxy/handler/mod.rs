pub mod request;

pub use request::{handle_upload_request, throttle_request};
