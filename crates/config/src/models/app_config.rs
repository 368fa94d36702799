use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    database::DatabaseConfig,
    mail::MailConfig,
    providers::ProvidersConfig,
};
use crate::validation::ConfigValidator;

const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config/relay.toml", "relay.toml", "/etc/relay/config.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub providers: ProvidersConfig,
    pub mail: MailConfig,
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 加载配置：显式路径或默认路径下的TOML文件，再叠加 `RELAY__` 前缀的环境变量
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("RELAY")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("mail.admin_recipients")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.api.validate()?;
        self.providers.validate()?;
        self.mail.validate()?;
        self.database.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}
