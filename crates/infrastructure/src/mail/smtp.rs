use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use relay_config::MailConfig;
use relay_domain::{ChannelError, DeliveryChannel, ErrorKind, OutboundMessage};
use relay_errors::{RelayError, RelayResult};

/// 基于 lettre 的SMTP投递通道，465端口使用隐式TLS，其余端口使用STARTTLS
pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    send_timeout: Duration,
}

impl SmtpChannel {
    pub fn new(config: &MailConfig) -> RelayResult<Self> {
        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| RelayError::config_error(format!("SMTP配置无效: {e}")))?;

        let send_timeout = Duration::from_secs(config.timeout_seconds);
        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(send_timeout))
            .build();

        let address: Address = config
            .sender_address()
            .parse()
            .map_err(|e| RelayError::config_error(format!("发件人地址无效: {e}")))?;
        let sender = Mailbox::new(Some(config.from_name.clone()), address);

        Ok(Self {
            transport,
            sender,
            send_timeout,
        })
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn build_message(
        &self,
        address: &str,
        message: &OutboundMessage,
    ) -> Result<Message, ChannelError> {
        let to: Mailbox = address.trim().parse().map_err(|e| {
            ChannelError::new(
                ErrorKind::Transport,
                format!("invalid recipient address {address}: {e}"),
            )
        })?;

        let builder = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(message.subject.clone());

        let built = match &message.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text_body.clone()),
        };

        built.map_err(|e| ChannelError::new(ErrorKind::Transport, format!("failed to build message: {e}")))
    }
}

fn classify_smtp_error(err: &lettre::transport::smtp::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_permanent() {
        ErrorKind::NonSuccessStatus
    } else {
        ErrorKind::Transport
    }
}

#[async_trait]
impl DeliveryChannel for SmtpChannel {
    async fn send(&self, address: &str, message: &OutboundMessage) -> Result<(), ChannelError> {
        let email = self.build_message(address, message)?;

        match tokio::time::timeout(self.send_timeout, self.transport.send(email)).await {
            Ok(Ok(response)) => {
                debug!(recipient = address, code = %response.code(), "SMTP服务器已接收邮件");
                Ok(())
            }
            Ok(Err(e)) => Err(ChannelError::new(classify_smtp_error(&e), e.to_string())),
            Err(_) => Err(ChannelError::new(
                ErrorKind::Timeout,
                format!("smtp send exceeded {}s", self.send_timeout.as_secs()),
            )),
        }
    }
}
