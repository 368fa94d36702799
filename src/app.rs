use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use relay_api::{create_app, AppState};
use relay_config::AppConfig;
use relay_dispatcher::{
    DispatchOrchestrator, EndpointFailoverResolver, GatedFanoutDispatcher, NotificationComposer,
};
use relay_infrastructure::{
    build_http_client, build_providers, create_delivery_channel, create_store,
};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;

/// 主应用程序
///
/// 所有外部依赖在这里一次性创建，再注入给编排器。
pub struct Application {
    config: AppConfig,
    state: AppState,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序");

        let store = create_store(&config.database)
            .await
            .with_context(|| format!("初始化存储失败: {}", mask_url(&config.database.url)))?;
        info!("存储已就绪: {}", mask_url(&config.database.url));

        let attempt_timeout = Duration::from_secs(config.providers.request_timeout_seconds);
        let client = build_http_client(attempt_timeout).context("创建HTTP客户端失败")?;
        let providers = build_providers(&config.providers, client);
        info!("已配置 {} 个远程端点", providers.len());

        let resolver = Arc::new(
            EndpointFailoverResolver::new(providers, attempt_timeout)
                .context("创建端点解析器失败")?,
        );

        let channel = create_delivery_channel(&config.mail).context("创建邮件通道失败")?;
        let dispatcher = Arc::new(GatedFanoutDispatcher::new(
            channel,
            Duration::from_secs(config.mail.timeout_seconds),
        ));

        let orchestrator = Arc::new(DispatchOrchestrator::new(
            resolver,
            dispatcher,
            store,
            NotificationComposer::new(config.mail.site_name.clone()),
            config.mail.admin_addresses(),
        ));
        info!("管理员收件人数量: {}", orchestrator.admin_count());

        Ok(Self {
            config,
            state: AppState::new(orchestrator),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        create_app(self.state.clone(), &self.config.api)
    }

    /// 启动HTTP服务，收到关闭信号后停止接收新连接并等待进行中的请求
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let bind_address = &self.config.api.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        info!("API服务器启动在 http://{}", bind_address);

        axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        info!("API服务器已停止");
        Ok(())
    }
}

/// 屏蔽URL中的密码
fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let mut masked = url.to_string();
            masked.replace_range(colon_pos + 1..at_pos, "***");
            return masked;
        }
    }
    url.to_string()
}
