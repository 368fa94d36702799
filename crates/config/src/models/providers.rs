use std::collections::HashSet;

use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

/// 单个回复端点，priority 越小越先尝试
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    pub id: String,
    pub url: String,
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub api_key: String,
    /// 每次端点尝试的超时时间
    pub request_timeout_seconds: u64,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub endpoints: Vec<EndpointConfig>,
}

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1/models";

impl Default for ProvidersConfig {
    fn default() -> Self {
        let models = [
            "gemini-2.0-flash",
            "gemini-2.0-flash-001",
            "gemini-2.0-flash-lite",
            "gemini-2.0-flash-lite-001",
        ];
        let endpoints = models
            .iter()
            .enumerate()
            .map(|(index, model)| EndpointConfig {
                id: (*model).to_string(),
                url: format!("{GEMINI_BASE}/{model}:generateContent"),
                priority: index as u32 + 1,
            })
            .collect();

        Self {
            api_key: String::new(),
            request_timeout_seconds: 15,
            max_output_tokens: 200,
            temperature: 0.7,
            endpoints,
        }
    }
}

impl ProvidersConfig {
    /// 未配置密钥时远程端点不可用，只走本地兜底
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl ConfigValidator for ProvidersConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "providers.request_timeout_seconds",
        )?;
        ValidationUtils::validate_count(
            self.max_output_tokens as usize,
            "providers.max_output_tokens",
        )?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(crate::ConfigError::Validation(
                "providers.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        let mut priorities = HashSet::new();
        for endpoint in &self.endpoints {
            ValidationUtils::validate_not_empty(&endpoint.id, "providers.endpoints.id")?;
            ValidationUtils::validate_url(&endpoint.url, "providers.endpoints.url")?;

            if !ids.insert(endpoint.id.as_str()) {
                return Err(crate::ConfigError::Validation(format!(
                    "Duplicate endpoint id: {}",
                    endpoint.id
                )));
            }
            if !priorities.insert(endpoint.priority) {
                return Err(crate::ConfigError::Validation(format!(
                    "Duplicate endpoint priority: {}",
                    endpoint.priority
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = ProvidersConfig::default();
        assert_eq!(config.endpoints.len(), 4);
        assert_eq!(config.endpoints[0].id, "gemini-2.0-flash");
        assert_eq!(
            config.endpoints[0].url,
            "https://generativelanguage.googleapis.com/v1/models/gemini-2.0-flash:generateContent"
        );
        let priorities: Vec<u32> = config.endpoints.iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
        assert!(!config.has_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let mut config = ProvidersConfig::default();
        config.endpoints[1].priority = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate endpoint priority"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut config = ProvidersConfig::default();
        config.endpoints[2].id = "gemini-2.0-flash".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_endpoint_list_is_valid() {
        let config = ProvidersConfig {
            endpoints: Vec::new(),
            ..ProvidersConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_temperature() {
        let config = ProvidersConfig {
            temperature: 3.5,
            ..ProvidersConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
