use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    /// 465 使用隐式TLS，其余端口使用STARTTLS
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// 为空时使用 username
    pub from_email: String,
    pub from_name: String,
    pub site_name: String,
    pub timeout_seconds: u64,
    pub admin_recipients: Vec<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: "The Samurai".to_string(),
            site_name: "The Samurai".to_string(),
            timeout_seconds: 30,
            admin_recipients: Vec::new(),
        }
    }
}

impl MailConfig {
    pub fn sender_address(&self) -> &str {
        if self.from_email.trim().is_empty() {
            self.username.trim()
        } else {
            self.from_email.trim()
        }
    }

    pub fn implicit_tls(&self) -> bool {
        self.smtp_port == 465
    }

    /// 去除空白和空项后的管理员地址
    pub fn admin_addresses(&self) -> Vec<String> {
        self.admin_recipients
            .iter()
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty())
            .collect()
    }
}

impl ConfigValidator for MailConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        for address in self.admin_addresses() {
            ValidationUtils::validate_email(&address, "mail.admin_recipients")?;
        }

        if !self.enabled {
            return Ok(());
        }

        ValidationUtils::validate_not_empty(&self.smtp_host, "mail.smtp_host")?;
        ValidationUtils::validate_port(self.smtp_port, "mail.smtp_port")?;
        ValidationUtils::validate_not_empty(&self.username, "mail.username")?;
        ValidationUtils::validate_not_empty(&self.password, "mail.password")?;
        ValidationUtils::validate_email(self.sender_address(), "mail.from_email")?;
        ValidationUtils::validate_not_empty(&self.site_name, "mail.site_name")?;
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds, "mail.timeout_seconds")?;
        Ok(())
    }
}
