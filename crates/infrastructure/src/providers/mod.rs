pub mod gemini;

pub use gemini::GeminiProvider;

use std::sync::Arc;
use std::time::Duration;

use relay_config::ProvidersConfig;
use relay_domain::ResponseProvider;
use relay_errors::{RelayError, RelayResult};
use tracing::{error, info};

/// 所有端点共用的HTTP客户端，超时由解析器按每次尝试控制
pub fn build_http_client(request_timeout: Duration) -> RelayResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!("relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RelayError::Network(format!("创建HTTP客户端失败: {e}")))
}

/// 按配置构造远程端点；未配置密钥时返回空列表，所有请求走本地兜底
pub fn build_providers(
    config: &ProvidersConfig,
    client: reqwest::Client,
) -> Vec<Arc<dyn ResponseProvider>> {
    if !config.has_api_key() {
        error!("未配置 providers.api_key，聊天回复将全部使用本地兜底");
        return Vec::new();
    }

    let providers: Vec<Arc<dyn ResponseProvider>> = config
        .endpoints
        .iter()
        .map(|endpoint| {
            Arc::new(GeminiProvider::new(
                endpoint,
                &config.api_key,
                config.max_output_tokens,
                config.temperature,
                client.clone(),
            )) as Arc<dyn ResponseProvider>
        })
        .collect();

    info!(count = providers.len(), "远程回复端点已加载");
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_providers_without_key() {
        let config = ProvidersConfig::default();
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        assert!(build_providers(&config, client).is_empty());
    }

    #[test]
    fn test_build_providers_keeps_descriptors() {
        let config = ProvidersConfig {
            api_key: "secret".to_string(),
            ..ProvidersConfig::default()
        };
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let providers = build_providers(&config, client);

        assert_eq!(providers.len(), 4);
        assert_eq!(providers[0].descriptor().id, "gemini-2.0-flash");
        assert_eq!(providers[3].descriptor().priority, 4);
    }
}
