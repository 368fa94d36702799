use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("数据验证失败: {0}")]
    Validation(String),
    #[error("持久化失败: {0}")]
    Persistence(String),
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("无效的收件人列表: {0}")]
    InvalidRecipients(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("网络错误: {0}")]
    Network(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn persistence_error<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }
    pub fn invalid_recipients<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRecipients(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    /// 持久化层失败（包括底层数据库错误）
    pub fn is_persistence(&self) -> bool {
        matches!(self, RelayError::Persistence(_) | RelayError::Database(_))
    }
    pub fn is_validation(&self) -> bool {
        matches!(self, RelayError::Validation(_))
    }
    pub fn user_message(&self) -> &str {
        match self {
            RelayError::Validation(msg) => msg,
            RelayError::Persistence(_) | RelayError::Database(_) => "提交内容保存失败，请稍后重试",
            RelayError::Network(_) => "网络异常，请稍后重试",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Internal(err.to_string())
    }
}
