use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::ContactRecord;
use crate::value_objects::{ContactStatus, Locale};
use relay_errors::{RelayError, RelayResult};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s+().-]+$").expect("phone pattern is valid"));

const MIN_PHONE_LENGTH: usize = 10;
const MIN_MESSAGE_LENGTH: usize = 10;

/// 联系表单原始提交内容
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub locale: Option<String>,
}

fn required<'a>(value: &'a Option<String>, label: &str) -> RelayResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RelayError::validation_error(format!("{label} is required"))),
    }
}

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address.trim())
}

pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| !c.is_whitespace()).count();
    digits >= MIN_PHONE_LENGTH && PHONE_PATTERN.is_match(phone)
}

impl ContactSubmission {
    /// 校验并规范化为待持久化的记录，失败时返回第一条不满足的规则
    pub fn into_record(self) -> RelayResult<ContactRecord> {
        let name = required(&self.name, "Name")?;
        let email = required(&self.email, "Email")?;
        let phone = required(&self.phone, "Phone")?;
        let subject = required(&self.subject, "Subject")?;
        let message = required(&self.message, "Message")?;

        if !is_valid_email(email) {
            return Err(RelayError::validation_error("Invalid email format"));
        }

        if !is_valid_phone(phone) {
            return Err(RelayError::validation_error(
                "Phone number must be at least 10 digits",
            ));
        }

        if message.chars().count() < MIN_MESSAGE_LENGTH {
            return Err(RelayError::validation_error(
                "Message must be at least 10 characters long",
            ));
        }

        let now = Utc::now();
        Ok(ContactRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_lowercase(),
            phone: phone.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            locale: Locale::from_code(self.locale.as_deref()).code().to_string(),
            status: ContactStatus::New,
            created_at: now,
            updated_at: now,
        })
    }
}

/// 聊天文本不能为空，返回去除首尾空白后的内容
pub fn validate_chat_text(text: Option<&str>) -> RelayResult<String> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(RelayError::validation_error("Message is required")),
    }
}
