use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gourmet::errors::ChatError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Invalid configuration: {0}")]
    Other(#[from] config::ConfigError),
}

// Convert a configuration key like `provider.api_key` to its environment variable
pub fn to_env_var(field_path: &str) -> String {
    format!("GOURMET_{}", field_path.to_uppercase().replace('.', "__"))
}

/// Errors returned from the HTTP handlers, rendered as `{ "error": message }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Chat(ChatError::ToolLoopExceeded { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Chat(ChatError::Provider(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Chat(ChatError::ModelTimeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Chat(ChatError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Chat(ChatError::Agent(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "chat request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
