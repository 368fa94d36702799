use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use relay_domain::{
    ChatMessage, ChatRecord, ChatReply, ContactReceipt, ContactSubmission, DeliveryOutcome,
    DispatchResult, EndpointDescriptor, ErrorKind, PersistenceStore, Recipient, ResponseRequest,
    CHAT_COLLECTION, CONTACT_COLLECTION,
};
use relay_errors::{RelayError, RelayResult};

use crate::fanout::GatedFanoutDispatcher;
use crate::notifications::NotificationComposer;
use crate::resolver::EndpointFailoverResolver;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 200;

/// 请求编排入口
///
/// 聊天：解析回复后异步写入记录，写入失败只记日志。
/// 联系表单：先同步持久化（失败即返回错误），再进行门控通知分发。
pub struct DispatchOrchestrator {
    resolver: Arc<EndpointFailoverResolver>,
    dispatcher: Arc<GatedFanoutDispatcher>,
    store: Arc<dyn PersistenceStore>,
    composer: NotificationComposer,
    admin_recipients: Vec<Recipient>,
}

impl DispatchOrchestrator {
    pub fn new(
        resolver: Arc<EndpointFailoverResolver>,
        dispatcher: Arc<GatedFanoutDispatcher>,
        store: Arc<dyn PersistenceStore>,
        composer: NotificationComposer,
        admin_addresses: Vec<String>,
    ) -> Self {
        let admin_recipients = admin_addresses
            .into_iter()
            .map(Recipient::secondary)
            .collect();
        Self {
            resolver,
            dispatcher,
            store,
            composer,
            admin_recipients,
        }
    }

    pub fn admin_count(&self) -> usize {
        self.admin_recipients.len()
    }

    pub fn endpoints(&self) -> Vec<EndpointDescriptor> {
        self.resolver.endpoints()
    }

    pub async fn store_health(&self) -> RelayResult<()> {
        self.store.health_check().await
    }

    pub async fn handle_chat_message(&self, message: ChatMessage) -> ChatReply {
        let request = ResponseRequest::new(message.text.clone(), message.locale);
        let resolved = self.resolver.resolve(&request).await;

        info!(
            session_id = %message.session_id,
            source = %resolved.source,
            "聊天回复已生成"
        );

        let record = ChatRecord::new(&message, &resolved);
        self.persist_chat_detached(record);

        ChatReply {
            response_text: resolved.text,
            source: resolved.source,
            session_id: message.session_id,
            timestamp: Utc::now(),
        }
    }

    /// 不等待写入结果，失败不影响已返回的回复
    fn persist_chat_detached(&self, record: ChatRecord) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let document = match serde_json::to_value(&record) {
                Ok(document) => document,
                Err(e) => {
                    error!(session_id = %record.session_id, error = %e, "聊天记录序列化失败");
                    return;
                }
            };
            if let Err(e) = store.save(CHAT_COLLECTION, &document).await {
                error!(session_id = %record.session_id, error = %e, "聊天记录保存失败");
            }
        });
    }

    pub async fn handle_contact_submission(
        &self,
        submission: ContactSubmission,
    ) -> RelayResult<ContactReceipt> {
        let record = submission.into_record()?;

        let document = serde_json::to_value(&record)?;
        self.store
            .save(CONTACT_COLLECTION, &document)
            .await
            .map_err(|e| {
                error!(contact_id = %record.id, error = %e, "联系记录保存失败");
                if e.is_persistence() {
                    e
                } else {
                    RelayError::persistence_error(e.to_string())
                }
            })?;

        info!(
            contact_id = %record.id,
            locale = %record.locale,
            message_length = record.message.chars().count(),
            "联系记录已保存"
        );

        if self.admin_recipients.is_empty() {
            warn!(contact_id = %record.id, "未配置管理员收件人，仅发送确认邮件");
        }

        let payload = self.composer.compose(&record);
        let primary = Recipient::primary(record.email.clone());
        // 记录已保存，分发错误只影响 notifications_sent
        let dispatch = match self
            .dispatcher
            .dispatch(&primary, &self.admin_recipients, &payload)
            .await
        {
            Ok(dispatch) => dispatch,
            Err(e) => {
                error!(contact_id = %record.id, error = %e, "通知分发被拒绝");
                DispatchResult::new(
                    DeliveryOutcome::failed(primary, ErrorKind::Transport, e.to_string()),
                    Vec::new(),
                )
            }
        };

        Ok(ContactReceipt {
            contact_id: record.id,
            accepted: true,
            notifications_sent: dispatch.overall_succeeded(),
            dispatch,
        })
    }

    /// 会话内的聊天记录，按时间升序
    pub async fn chat_history(&self, session_id: &str, limit: usize) -> RelayResult<Vec<ChatRecord>> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let documents = self
            .store
            .find_by(CHAT_COLLECTION, "session_id", session_id, limit)
            .await?;

        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(RelayError::from))
            .collect()
    }
}
