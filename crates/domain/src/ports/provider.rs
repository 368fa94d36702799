use async_trait::async_trait;
use thiserror::Error;

use crate::entities::{EndpointDescriptor, ResponseRequest};
use crate::value_objects::ErrorKind;

/// 远程调用失败，kind 决定解析器如何记录
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NonSuccessStatus, message)
    }

    pub fn empty_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyPayload, message)
    }
}

/// 单个远程回复端点
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    fn descriptor(&self) -> &EndpointDescriptor;

    /// 返回非空文本，或分类后的失败
    async fn generate(&self, request: &ResponseRequest) -> Result<String, ProviderError>;
}
