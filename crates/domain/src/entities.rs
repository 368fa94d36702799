use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::value_objects::{ContactStatus, ErrorKind, Locale, RecipientRole};

pub const CHAT_COLLECTION: &str = "chat_messages";
pub const CONTACT_COLLECTION: &str = "contacts";

/// 回复解析器的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRequest {
    pub text: String,
    pub locale: Locale,
}

impl ResponseRequest {
    pub fn new(text: impl Into<String>, locale: Locale) -> Self {
        Self {
            text: text.into(),
            locale,
        }
    }
}

/// 远程端点描述，priority 升序即尝试顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub id: String,
    pub priority: u32,
}

/// 单次端点尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub endpoint_id: String,
    pub succeeded: bool,
    pub error_kind: Option<ErrorKind>,
    pub payload: Option<String>,
}

impl AttemptOutcome {
    pub fn success(endpoint_id: &str, payload: String) -> Self {
        Self {
            endpoint_id: endpoint_id.to_string(),
            succeeded: true,
            error_kind: None,
            payload: Some(payload),
        }
    }

    pub fn failure(endpoint_id: &str, kind: ErrorKind) -> Self {
        Self {
            endpoint_id: endpoint_id.to_string(),
            succeeded: false,
            error_kind: Some(kind),
            payload: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    Endpoint(String),
    Fallback,
}

impl ResponseSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ResponseSource::Fallback)
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Endpoint(id) => write!(f, "endpoint:{id}"),
            ResponseSource::Fallback => f.write_str("fallback"),
        }
    }
}

impl Serialize for ResponseSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResponse {
    pub text: String,
    pub source: ResponseSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub role: RecipientRole,
}

impl Recipient {
    pub fn primary(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            role: RecipientRole::Primary,
        }
    }

    pub fn secondary(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            role: RecipientRole::Secondary,
        }
    }
}

/// 单个收件人的投递结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    #[serde(flatten)]
    pub recipient: Recipient,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(recipient: Recipient) -> Self {
        Self {
            recipient,
            succeeded: true,
            error_kind: None,
            error: None,
        }
    }

    pub fn failed(recipient: Recipient, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            recipient,
            succeeded: false,
            error_kind: Some(kind),
            error: Some(error.into()),
        }
    }
}

/// 一次门控分发的汇总结果，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    primary: DeliveryOutcome,
    secondary: Vec<DeliveryOutcome>,
    #[serde(skip)]
    overall_succeeded: bool,
}

impl DispatchResult {
    /// 主投递成功，或至少一个次级投递成功，即视为整体成功
    pub fn new(primary: DeliveryOutcome, secondary: Vec<DeliveryOutcome>) -> Self {
        let overall_succeeded =
            primary.succeeded || secondary.iter().any(|outcome| outcome.succeeded);
        Self {
            primary,
            secondary,
            overall_succeeded,
        }
    }

    pub fn primary(&self) -> &DeliveryOutcome {
        &self.primary
    }

    pub fn secondary(&self) -> &[DeliveryOutcome] {
        &self.secondary
    }

    pub fn overall_succeeded(&self) -> bool {
        self.overall_succeeded
    }

    pub fn secondary_failures(&self) -> usize {
        self.secondary.iter().filter(|o| !o.succeeded).count()
    }
}

/// 待处理的聊天消息，文本已校验并去除首尾空白
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub locale: Locale,
    pub session_id: String,
    pub user_agent: String,
    pub ip_address: String,
}

/// 聊天持久化记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRecord {
    pub id: String,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub source: String,
    pub locale: String,
    pub user_agent: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(message: &ChatMessage, resolved: &ResolvedResponse) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: message.session_id.clone(),
            message: message.text.clone(),
            response: resolved.text.clone(),
            source: resolved.source.to_string(),
            locale: message.locale.code().to_string(),
            user_agent: message.user_agent.clone(),
            ip_address: message.ip_address.clone(),
            created_at: Utc::now(),
        }
    }
}

/// 联系表单持久化记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub locale: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRecord {
    pub fn locale(&self) -> Locale {
        Locale::from_code(Some(&self.locale))
    }
}

/// 聊天处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response_text: String,
    pub source: ResponseSource,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// 联系表单处理结果，accepted 只反映持久化是否成功
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactReceipt {
    pub contact_id: String,
    pub accepted: bool,
    pub notifications_sent: bool,
    pub dispatch: DispatchResult,
}

const SESSION_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 生成形如 `<unix毫秒>-<9位base36>` 的会话ID
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| SESSION_ALPHABET[rng.random_range(0..SESSION_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
