use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub cors_enabled: bool,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_enabled: true,
            request_timeout_seconds: 60,
        }
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.bind_address, "api.bind_address")?;
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::ConfigError::Validation(format!(
                "api.bind_address is not a valid socket address: {}",
                self.bind_address
            )));
        }
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "api.request_timeout_seconds",
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// `pretty` 或 `json`
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(crate::ConfigError::Validation(format!(
                "Invalid log level: {}. Valid levels: {valid_levels:?}",
                self.log_level
            )));
        }

        match self.log_format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(crate::ConfigError::Validation(format!(
                "observability.log_format must be pretty or json, got {other}"
            ))),
        }
    }
}
