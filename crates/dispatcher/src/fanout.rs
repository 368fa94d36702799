use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use relay_domain::{
    DeliveryChannel, DeliveryOutcome, DispatchResult, ErrorKind, OutboundMessage, Recipient,
    RecipientRole,
};
use relay_errors::{RelayError, RelayResult};

/// 主收件人与次级收件人各自的消息内容
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub primary: OutboundMessage,
    pub secondary: OutboundMessage,
}

/// 门控扇出分发器
///
/// 先同步投递主收件人；仅当主投递成功时，才并发投递全部次级收件人并等待全部完成。
/// 单个投递失败只记录在结果中，不会向上抛出，也不会影响其他投递。
pub struct GatedFanoutDispatcher {
    channel: Arc<dyn DeliveryChannel>,
    send_timeout: Duration,
}

impl GatedFanoutDispatcher {
    pub fn new(channel: Arc<dyn DeliveryChannel>, send_timeout: Duration) -> Self {
        Self {
            channel,
            send_timeout,
        }
    }

    pub async fn dispatch(
        &self,
        primary: &Recipient,
        secondaries: &[Recipient],
        payload: &NotificationPayload,
    ) -> RelayResult<DispatchResult> {
        validate_recipients(primary, secondaries)?;

        let primary_outcome = joined_outcome(
            primary,
            tokio::spawn(deliver(
                Arc::clone(&self.channel),
                primary.clone(),
                payload.primary.clone(),
                self.send_timeout,
            ))
            .await,
        );

        if !primary_outcome.succeeded {
            warn!(
                recipient = %primary.address,
                skipped = secondaries.len(),
                "主收件人投递失败，跳过次级通知"
            );
            return Ok(DispatchResult::new(primary_outcome, Vec::new()));
        }

        let secondary = self.fan_out(secondaries, &payload.secondary).await;
        let result = DispatchResult::new(primary_outcome, secondary);

        info!(
            secondary_total = result.secondary().len(),
            secondary_failed = result.secondary_failures(),
            overall_succeeded = result.overall_succeeded(),
            "通知分发完成"
        );
        Ok(result)
    }

    /// 每个次级收件人一个独立任务，结果顺序与输入一致
    async fn fan_out(
        &self,
        secondaries: &[Recipient],
        message: &OutboundMessage,
    ) -> Vec<DeliveryOutcome> {
        let handles = secondaries.iter().map(|recipient| {
            tokio::spawn(deliver(
                Arc::clone(&self.channel),
                recipient.clone(),
                message.clone(),
                self.send_timeout,
            ))
        });
        let joined = join_all(handles).await;

        secondaries
            .iter()
            .zip(joined)
            .map(|(recipient, joined)| joined_outcome(recipient, joined))
            .collect()
    }
}

fn joined_outcome(
    recipient: &Recipient,
    joined: Result<DeliveryOutcome, JoinError>,
) -> DeliveryOutcome {
    match joined {
        Ok(outcome) => outcome,
        Err(join_err) => {
            error!(recipient = %recipient.address, error = %join_err, "投递任务异常终止");
            DeliveryOutcome::failed(
                recipient.clone(),
                ErrorKind::Transport,
                format!("delivery task aborted: {join_err}"),
            )
        }
    }
}

fn validate_recipients(primary: &Recipient, secondaries: &[Recipient]) -> RelayResult<()> {
    if primary.role != RecipientRole::Primary {
        return Err(RelayError::invalid_recipients("主收件人角色必须为 primary"));
    }
    if primary.address.trim().is_empty() {
        return Err(RelayError::invalid_recipients("主收件人地址为空"));
    }
    for recipient in secondaries {
        if recipient.role != RecipientRole::Secondary {
            return Err(RelayError::invalid_recipients(format!(
                "次级收件人角色必须为 secondary: {}",
                recipient.address
            )));
        }
        if recipient.address.trim().is_empty() {
            return Err(RelayError::invalid_recipients("次级收件人地址为空"));
        }
    }
    Ok(())
}

async fn deliver(
    channel: Arc<dyn DeliveryChannel>,
    recipient: Recipient,
    message: OutboundMessage,
    send_timeout: Duration,
) -> DeliveryOutcome {
    let result = tokio::time::timeout(send_timeout, channel.send(&recipient.address, &message)).await;

    let outcome = match result {
        Ok(Ok(())) => DeliveryOutcome::delivered(recipient),
        Ok(Err(err)) => DeliveryOutcome::failed(recipient, err.kind, err.message),
        Err(_) => DeliveryOutcome::failed(
            recipient,
            ErrorKind::Timeout,
            format!("send exceeded {}s", send_timeout.as_secs_f32()),
        ),
    };

    if outcome.succeeded {
        info!(recipient = %outcome.recipient.address, role = ?outcome.recipient.role, "邮件投递成功");
    } else {
        warn!(
            recipient = %outcome.recipient.address,
            role = ?outcome.recipient.role,
            error_kind = ?outcome.error_kind,
            error = outcome.error.as_deref().unwrap_or_default(),
            "邮件投递失败"
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingChannel;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            primary: OutboundMessage {
                subject: "Thank you".to_string(),
                text_body: "We got it".to_string(),
                html_body: None,
            },
            secondary: OutboundMessage {
                subject: "New submission".to_string(),
                text_body: "Details".to_string(),
                html_body: Some("<p>Details</p>".to_string()),
            },
        }
    }

    fn admins() -> Vec<Recipient> {
        vec![
            Recipient::secondary("admin1@example.com"),
            Recipient::secondary("admin2@example.com"),
            Recipient::secondary("admin3@example.com"),
        ]
    }

    #[tokio::test]
    async fn test_primary_failure_skips_secondaries() {
        let channel = Arc::new(
            RecordingChannel::new().failing_for("user@example.com", ErrorKind::Transport),
        );
        let dispatcher = GatedFanoutDispatcher::new(channel.clone(), Duration::from_secs(1));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &admins(), &payload())
            .await
            .unwrap();

        assert!(!result.primary().succeeded);
        assert_eq!(result.primary().error_kind, Some(ErrorKind::Transport));
        assert!(result.secondary().is_empty());
        assert!(!result.overall_succeeded());
        assert_eq!(channel.attempts(), vec!["user@example.com"]);
    }

    #[tokio::test]
    async fn test_partial_secondary_failure_is_isolated() {
        let channel = Arc::new(
            RecordingChannel::new().failing_for("admin2@example.com", ErrorKind::NonSuccessStatus),
        );
        let dispatcher = GatedFanoutDispatcher::new(channel.clone(), Duration::from_secs(1));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &admins(), &payload())
            .await
            .unwrap();

        assert!(result.overall_succeeded());
        let secondary = result.secondary();
        assert_eq!(secondary.len(), 3);
        assert!(secondary[0].succeeded);
        assert!(!secondary[1].succeeded);
        assert_eq!(secondary[1].recipient.address, "admin2@example.com");
        assert_eq!(secondary[1].error_kind, Some(ErrorKind::NonSuccessStatus));
        assert!(secondary[2].succeeded);

        let sent = channel.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].1.subject, "Thank you");
        assert!(sent[1..].iter().all(|(_, m)| m.subject == "New submission"));
    }

    #[tokio::test]
    async fn test_slow_secondary_times_out_without_blocking_others() {
        let channel = Arc::new(
            RecordingChannel::new().delayed_for("admin1@example.com", Duration::from_secs(5)),
        );
        let dispatcher = GatedFanoutDispatcher::new(channel.clone(), Duration::from_millis(100));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &admins(), &payload())
            .await
            .unwrap();

        let secondary = result.secondary();
        assert_eq!(secondary[0].error_kind, Some(ErrorKind::Timeout));
        assert!(secondary[1].succeeded);
        assert!(secondary[2].succeeded);
    }

    #[tokio::test]
    async fn test_crashed_delivery_task_is_reported() {
        let channel = Arc::new(RecordingChannel::new().panicking_for("admin3@example.com"));
        let dispatcher = GatedFanoutDispatcher::new(channel, Duration::from_secs(1));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &admins(), &payload())
            .await
            .unwrap();

        let secondary = result.secondary();
        assert_eq!(secondary.len(), 3);
        assert!(!secondary[2].succeeded);
        assert_eq!(secondary[2].recipient.address, "admin3@example.com");
        assert!(result.overall_succeeded());
    }

    #[tokio::test]
    async fn test_crashed_primary_closes_gate() {
        let channel = Arc::new(RecordingChannel::new().panicking_for("user@example.com"));
        let dispatcher = GatedFanoutDispatcher::new(channel.clone(), Duration::from_secs(1));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &admins(), &payload())
            .await
            .unwrap();

        assert!(!result.primary().succeeded);
        assert_eq!(result.primary().error_kind, Some(ErrorKind::Transport));
        assert!(result.secondary().is_empty());
        assert_eq!(channel.attempts(), vec!["user@example.com"]);
    }

    #[tokio::test]
    async fn test_all_secondaries_fail_primary_still_counts() {
        let channel = Arc::new(
            RecordingChannel::new()
                .failing_for("admin1@example.com", ErrorKind::Transport)
                .failing_for("admin2@example.com", ErrorKind::Transport)
                .failing_for("admin3@example.com", ErrorKind::Transport),
        );
        let dispatcher = GatedFanoutDispatcher::new(channel, Duration::from_secs(1));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &admins(), &payload())
            .await
            .unwrap();

        assert_eq!(result.secondary_failures(), 3);
        assert!(result.overall_succeeded());
    }

    #[tokio::test]
    async fn test_no_secondaries() {
        let channel = Arc::new(RecordingChannel::new());
        let dispatcher = GatedFanoutDispatcher::new(channel, Duration::from_secs(1));

        let result = dispatcher
            .dispatch(&Recipient::primary("user@example.com"), &[], &payload())
            .await
            .unwrap();

        assert!(result.secondary().is_empty());
        assert!(result.overall_succeeded());
    }

    #[tokio::test]
    async fn test_invalid_recipients_rejected() {
        let channel = Arc::new(RecordingChannel::new());
        let dispatcher = GatedFanoutDispatcher::new(channel.clone(), Duration::from_secs(1));

        let err = dispatcher
            .dispatch(&Recipient::primary("  "), &admins(), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRecipients(_)));

        let err = dispatcher
            .dispatch(
                &Recipient::secondary("user@example.com"),
                &admins(),
                &payload(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRecipients(_)));

        let err = dispatcher
            .dispatch(
                &Recipient::primary("user@example.com"),
                &[Recipient::primary("admin@example.com")],
                &payload(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRecipients(_)));

        assert!(channel.attempts().is_empty());
    }
}
