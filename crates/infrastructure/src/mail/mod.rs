pub mod disabled;
pub mod smtp;

pub use disabled::DisabledChannel;
pub use smtp::SmtpChannel;

use std::sync::Arc;

use relay_config::MailConfig;
use relay_domain::DeliveryChannel;
use relay_errors::RelayResult;
use tracing::{info, warn};

/// 根据配置选择投递通道，关闭邮件时使用始终失败的通道
pub fn create_delivery_channel(config: &MailConfig) -> RelayResult<Arc<dyn DeliveryChannel>> {
    if !config.enabled {
        warn!("邮件发送已关闭，联系表单仍会保存，但不会发送通知");
        return Ok(Arc::new(DisabledChannel));
    }

    let channel = SmtpChannel::new(config)?;
    info!(
        host = %config.smtp_host,
        port = config.smtp_port,
        implicit_tls = config.implicit_tls(),
        "SMTP通道已创建"
    );
    Ok(Arc::new(channel))
}
