use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use relay_domain::{ChatRecord, ChatReply, ContactReceipt, DeliveryOutcome};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub source: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            success: true,
            response: reply.response_text,
            source: reply.source.to_string(),
            session_id: reply.session_id,
            timestamp: reply.timestamp,
        }
    }
}

impl IntoResponse for ChatResponse {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub data: Vec<ChatRecord>,
    pub count: usize,
}

impl ChatHistoryResponse {
    pub fn new(data: Vec<ChatRecord>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

impl IntoResponse for ChatHistoryResponse {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Deliveries {
    pub primary: DeliveryOutcome,
    pub secondary: Vec<DeliveryOutcome>,
}

/// 联系表单提交成功后以 201 返回
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub accepted: bool,
    pub notifications_sent: bool,
    pub contact_id: String,
    pub deliveries: Deliveries,
    pub message: String,
}

impl From<ContactReceipt> for ContactResponse {
    fn from(receipt: ContactReceipt) -> Self {
        let message = if receipt.notifications_sent {
            "Thank you for your message. We will get back to you soon."
        } else {
            "Your message was received, but notification delivery is delayed."
        };
        Self {
            success: true,
            accepted: receipt.accepted,
            notifications_sent: receipt.notifications_sent,
            contact_id: receipt.contact_id,
            deliveries: Deliveries {
                primary: receipt.dispatch.primary().clone(),
                secondary: receipt.dispatch.secondary().to_vec(),
            },
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ContactResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}
