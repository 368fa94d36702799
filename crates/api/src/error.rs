use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_errors::RelayError;
use serde_json::json;
use tokio::task::JoinError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("服务错误: {0}")]
    Relay(#[from] RelayError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Internal(format!("请求处理任务异常终止: {err}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Relay(RelayError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                "VALIDATION_ERROR",
                vec!["请检查提交的字段后重试".to_string()],
            ),
            ApiError::Relay(RelayError::InvalidRecipients(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
                "INVALID_RECIPIENTS",
                vec!["请检查管理员收件人配置".to_string()],
            ),
            ApiError::Relay(e) if e.is_persistence() => {
                error!("持久化错误: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.user_message().to_string(),
                    "PERSISTENCE_ERROR",
                    vec!["请稍后重试".to_string()],
                )
            }
            ApiError::Relay(e) => {
                error!("服务错误: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.user_message().to_string(),
                    "INTERNAL_ERROR",
                    vec!["请稍后重试".to_string()],
                )
            }
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                "BAD_REQUEST",
                vec!["请确认请求体是合法的JSON".to_string()],
            ),
            ApiError::Internal(msg) => {
                error!("内部服务器错误: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部服务器错误".to_string(),
                    "INTERNAL_ERROR",
                    vec!["请稍后重试".to_string()],
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
