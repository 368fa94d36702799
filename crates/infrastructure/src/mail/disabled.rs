use async_trait::async_trait;

use relay_domain::{ChannelError, DeliveryChannel, ErrorKind, OutboundMessage};

/// `mail.enabled = false` 时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledChannel;

#[async_trait]
impl DeliveryChannel for DisabledChannel {
    async fn send(&self, address: &str, _message: &OutboundMessage) -> Result<(), ChannelError> {
        Err(ChannelError::new(
            ErrorKind::Transport,
            format!("mail delivery is disabled, not sending to {address}"),
        ))
    }
}
