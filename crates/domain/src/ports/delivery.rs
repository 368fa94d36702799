use async_trait::async_trait;
use thiserror::Error;

use crate::value_objects::ErrorKind;

/// 发送给单个收件人的消息内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ChannelError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ChannelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 单收件人投递通道，失败不在通道内重试
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, address: &str, message: &OutboundMessage) -> Result<(), ChannelError>;
}
