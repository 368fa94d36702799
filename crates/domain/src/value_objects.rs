use serde::{Deserialize, Serialize};
use std::fmt;

/// 语言区域：primary 为英文，secondary 为阿拉伯文
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Primary,
    Secondary,
}

impl Locale {
    /// 解析线上传入的语言代码，`ar` 及其地区变体映射为 secondary，其余一律为 primary
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()) {
            Some(c) if c == "ar" || c.starts_with("ar-") || c.starts_with("ar_") => {
                Locale::Secondary
            }
            _ => Locale::Primary,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Primary => "en",
            Locale::Secondary => "ar",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Locale::Secondary)
    }
}

/// 远程调用或投递失败的分类，只作为结果记录，不向上抛出
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    Transport,
    NonSuccessStatus,
    EmptyPayload,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Transport => "Transport",
            ErrorKind::NonSuccessStatus => "NonSuccessStatus",
            ErrorKind::EmptyPayload => "EmptyPayload",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecipientRole {
    Primary,
    Secondary,
}

/// 联系记录的处理状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Replied,
    Archived,
}
