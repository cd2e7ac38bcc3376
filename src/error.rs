use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Server configuration error: {0}")]
    Config(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Timeout(String),

    #[error("Invalid response from crawl server: {0}")]
    InvalidUpstreamResponse(String),

    #[error("Crawl server error: {status}")]
    Upstream { status: u16, message: String },

    #[error("Failed to reach upstream service: {0}")]
    Transport(String),

    #[error("Failed to extract data: {0}")]
    Extraction(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::InvalidUpstreamResponse(_) => StatusCode::BAD_GATEWAY,
            // Upstream codes outside the error range would read as success to the caller
            AppError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AppError::Upstream { message, .. } = &self {
            tracing::debug!(%message, "upstream error detail");
        }
        match status {
            s if s.is_server_error() => tracing::error!(status = s.as_u16(), "{}", self),
            s => tracing::warn!(status = s.as_u16(), "{}", self),
        }

        response::error(status, self.to_string()).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::Timeout(
                "Request timeout. The server took too long to respond.".to_string(),
            );
        }

        match err.status() {
            Some(status) => AppError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AppError::Transport(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Config("missing".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Timeout("slow".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::InvalidUpstreamResponse("no id".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Extraction("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_status_is_propagated() {
        let err = AppError::Upstream {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Crawl server error: 503");
    }

    #[test]
    fn non_error_upstream_status_becomes_bad_gateway() {
        let err = AppError::Upstream {
            status: 204,
            message: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
