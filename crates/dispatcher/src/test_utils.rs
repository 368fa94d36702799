//! 测试用的端口模拟实现

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use relay_domain::{
    ChannelError, DeliveryChannel, EndpointDescriptor, ErrorKind, OutboundMessage,
    PersistenceStore, ProviderError, ResponseProvider, ResponseRequest,
};
use relay_errors::{RelayError, RelayResult};

/// 脚本化提供方的行为
#[derive(Debug, Clone)]
pub enum ProviderBehavior {
    Reply(String),
    Fail(ErrorKind),
    /// 在返回前睡眠，用于触发超时
    Stall(Duration),
}

/// 按预设行为应答，并把调用顺序记到共享日志里
pub struct ScriptedProvider {
    descriptor: EndpointDescriptor,
    behavior: ProviderBehavior,
    calls: AtomicUsize,
    call_log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(id: &str, priority: u32, behavior: ProviderBehavior) -> Self {
        Self::with_log(id, priority, behavior, Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(
        id: &str,
        priority: u32,
        behavior: ProviderBehavior,
        call_log: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            descriptor: EndpointDescriptor {
                id: id.to_string(),
                priority,
            },
            behavior,
            calls: AtomicUsize::new(0),
            call_log,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseProvider for ScriptedProvider {
    fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    async fn generate(&self, _request: &ResponseRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_log.lock().unwrap().push(self.descriptor.id.clone());

        match &self.behavior {
            ProviderBehavior::Reply(text) => Ok(text.clone()),
            ProviderBehavior::Fail(kind) => Err(ProviderError::new(*kind, "scripted failure")),
            ProviderBehavior::Stall(duration) => {
                tokio::time::sleep(*duration).await;
                Ok("too late".to_string())
            }
        }
    }
}

/// 记录所有投递，按地址注入失败或延迟
#[derive(Default)]
pub struct RecordingChannel {
    failures: HashMap<String, ErrorKind>,
    delays: HashMap<String, Duration>,
    panics: Vec<String>,
    sent: Mutex<Vec<(String, OutboundMessage)>>,
    attempts: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, address: &str, kind: ErrorKind) -> Self {
        self.failures.insert(address.to_string(), kind);
        self
    }

    pub fn delayed_for(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    pub fn panicking_for(mut self, address: &str) -> Self {
        self.panics.push(address.to_string());
        self
    }

    /// 成功投递的记录
    pub fn sent(&self) -> Vec<(String, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    /// 所有尝试过的地址，包括失败的
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn send(&self, address: &str, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.attempts.lock().unwrap().push(address.to_string());

        if let Some(delay) = self.delays.get(address) {
            tokio::time::sleep(*delay).await;
        }
        if self.panics.iter().any(|a| a == address) {
            panic!("channel crashed for {address}");
        }
        if let Some(kind) = self.failures.get(address) {
            return Err(ChannelError::new(*kind, format!("delivery to {address} failed")));
        }

        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), message.clone()));
        Ok(())
    }
}

/// 内存记录存储，可配置为始终失败
#[derive(Default)]
pub struct MockStore {
    records: Mutex<Vec<(String, serde_json::Value)>>,
    fail: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self, collection: &str) -> Vec<serde_json::Value> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl PersistenceStore for MockStore {
    async fn save(&self, collection: &str, record: &serde_json::Value) -> RelayResult<()> {
        if self.fail {
            return Err(RelayError::persistence_error("mock store unavailable"));
        }
        self.records
            .lock()
            .unwrap()
            .push((collection.to_string(), record.clone()));
        Ok(())
    }

    async fn health_check(&self) -> RelayResult<()> {
        if self.fail {
            return Err(RelayError::persistence_error("mock store unavailable"));
        }
        Ok(())
    }

    async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: usize,
    ) -> RelayResult<Vec<serde_json::Value>> {
        if self.fail {
            return Err(RelayError::persistence_error("mock store unavailable"));
        }
        Ok(self
            .records(collection)
            .into_iter()
            .filter(|record| record.get(field).and_then(|v| v.as_str()) == Some(value))
            .take(limit)
            .collect())
    }
}
