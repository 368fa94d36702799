use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use relay_dispatcher::DEFAULT_HISTORY_LIMIT;
use relay_domain::{generate_session_id, validate_chat_text, ChatMessage, Locale};
use relay_errors::RelayError;

use crate::{
    error::ApiResult,
    response::{ChatHistoryResponse, ChatResponse},
    routes::AppState,
};

const UNKNOWN: &str = "unknown";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    #[serde(alias = "text")]
    pub message: Option<String>,
    pub locale: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryQuery {
    pub session_id: Option<String>,
    pub limit: Option<usize>,
}

pub async fn send_chat_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(body) = payload?;
    let text = validate_chat_text(body.message.as_deref())?;

    let session_id = body
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generate_session_id);

    let message = ChatMessage {
        text,
        locale: Locale::from_code(body.locale.as_deref()),
        session_id,
        user_agent: user_agent(&headers),
        ip_address: client_ip(&headers),
    };

    debug!(session_id = %message.session_id, locale = %message.locale.code(), "收到聊天请求");

    // 独立任务中运行，客户端断开或请求被丢弃时解析仍会完成并写入记录
    let orchestrator = Arc::clone(&state.orchestrator);
    let reply = tokio::spawn(async move { orchestrator.handle_chat_message(message).await }).await?;
    Ok(ChatResponse::from(reply))
}

pub async fn get_chat_history(
    State(state): State<AppState>,
    query: Result<Query<ChatHistoryQuery>, QueryRejection>,
) -> ApiResult<ChatHistoryResponse> {
    let Query(query) = query?;
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RelayError::validation_error("Session ID is required"))?;

    let records = state
        .orchestrator
        .chat_history(session_id, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;

    Ok(ChatHistoryResponse::new(records))
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// 取 `X-Forwarded-For` 的第一个地址
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_uses_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_user_agent_defaults_to_unknown() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_agent(&headers), "unknown");

        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        assert_eq!(user_agent(&headers), "curl/8.0");
    }

    #[test]
    fn test_body_accepts_text_alias() {
        let body: ChatRequestBody =
            serde_json::from_str(r#"{"text":"hi","sessionId":"abc"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("hi"));
        assert_eq!(body.session_id.as_deref(), Some("abc"));
    }
}
