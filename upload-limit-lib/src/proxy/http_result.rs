use http::StatusCode;
use thiserror::Error;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub(crate) type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong while proxying an upload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("No route matches the request path")]
    NoMatchingRoute,

    #[error("Failed to get response from backend: {0}")]
    BackendUnavailable(String),

    #[error("Upload throttle failed: {0}")]
    UploadThrottle(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

impl HttpError {
    /// Label value used by the error metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::NoMatchingRoute => "no_matching_route",
            HttpError::BackendUnavailable(_) => "backend_error",
            HttpError::UploadThrottle(_) => "upload_throttle",
            HttpError::InvalidUri(_) => "invalid_uri",
        }
    }
}

impl From<HttpError> for StatusCode {
    fn from(e: HttpError) -> StatusCode {
        match e {
            HttpError::NoMatchingRoute => StatusCode::NOT_FOUND,
            HttpError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            HttpError::UploadThrottle(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::InvalidUri(_) => StatusCode::BAD_REQUEST,
        }
    }
}
