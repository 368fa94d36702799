use crate::ConfigResult;

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    pub fn validate_port(port: u16, field_name: &str) -> ConfigResult<()> {
        if port == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} cannot be 0"
            )));
        }
        Ok(())
    }

    /// Validate that a timeout lies in (0, 3600]
    pub fn validate_timeout_seconds(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 3600 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600"
            )));
        }
        Ok(())
    }

    pub fn validate_count(count: usize, field_name: &str) -> ConfigResult<()> {
        if count == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > 10000 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 10000"
            )));
        }
        Ok(())
    }

    /// Validate that a URL carries a scheme
    pub fn validate_url(url: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(url, field_name)?;
        if !url.contains("://") {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be a valid URL with protocol"
            )));
        }
        Ok(())
    }

    /// Loose mailbox check, full address validation happens at send time
    pub fn validate_email(address: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(address, field_name)?;
        let trimmed = address.trim();
        let valid = match trimmed.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !trimmed.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} is not a valid email address: {address}"
            )));
        }
        Ok(())
    }
}
