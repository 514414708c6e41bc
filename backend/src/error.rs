use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::{ErrorKind, ErrorResponse};

/// Failures of a single prediction request. None of them touch the shared model.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("Image exceeds decode limits: {0}")]
    ImageTooLarge(String),
    #[error("Multipart field `file` is missing or empty")]
    MissingFile,
    #[error("Malformed multipart body: {0}")]
    Multipart(String),
    #[error("Request did not finish within {0} seconds")]
    Timeout(u64),
    #[error("Classifier failed: {0}")]
    Classifier(String),
    #[error("Classifier returned {got} scores for {expected} classes")]
    OutputShape { expected: usize, got: usize },
    #[error("Classifier returned a non-finite score at index {0}")]
    NonFiniteScore(usize),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::Decode(_) => ErrorKind::DecodeError,
            InferenceError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            InferenceError::ImageTooLarge(_) => ErrorKind::ImageTooLarge,
            InferenceError::MissingFile => ErrorKind::MissingFile,
            InferenceError::Multipart(_) => ErrorKind::InvalidMultipart,
            InferenceError::Timeout(_) => ErrorKind::Timeout,
            InferenceError::Classifier(_)
            | InferenceError::OutputShape { .. }
            | InferenceError::NonFiniteScore(_) => ErrorKind::InferenceError,
            InferenceError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<image::ImageError> for InferenceError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(e) => InferenceError::ImageTooLarge(e.to_string()),
            other => InferenceError::Decode(other.to_string()),
        }
    }
}

impl From<actix_multipart::MultipartError> for InferenceError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        InferenceError::Multipart(err.to_string())
    }
}

impl ResponseError for InferenceError {
    fn status_code(&self) -> StatusCode {
        match self {
            InferenceError::Decode(_)
            | InferenceError::MissingFile
            | InferenceError::Multipart(_) => StatusCode::BAD_REQUEST,
            InferenceError::PayloadTooLarge { .. } | InferenceError::ImageTooLarge(_) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            InferenceError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Prediction failed ({}): {}", status, self);
        } else {
            log::warn!("Rejected prediction request ({}): {}", status, self);
        }
        HttpResponse::build(status).json(ErrorResponse::new(self.kind(), self.to_string()))
    }
}
