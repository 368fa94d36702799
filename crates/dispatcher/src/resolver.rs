use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use relay_domain::{
    AttemptOutcome, EndpointDescriptor, ErrorKind, ResolvedResponse, ResponseProvider,
    ResponseRequest, ResponseSource,
};
use relay_errors::{RelayError, RelayResult};

use crate::fallback::LocalFallbackResponder;

/// 按优先级依次尝试远程端点，全部失败时返回本地兜底回复
pub struct EndpointFailoverResolver {
    providers: Vec<Arc<dyn ResponseProvider>>,
    fallback: LocalFallbackResponder,
    attempt_timeout: Duration,
}

impl EndpointFailoverResolver {
    /// 端点按 priority 升序排列，优先级重复视为配置错误
    pub fn new(
        mut providers: Vec<Arc<dyn ResponseProvider>>,
        attempt_timeout: Duration,
    ) -> RelayResult<Self> {
        let mut seen = HashSet::new();
        for provider in &providers {
            let descriptor = provider.descriptor();
            if !seen.insert(descriptor.priority) {
                return Err(RelayError::config_error(format!(
                    "端点优先级重复: {} (priority={})",
                    descriptor.id, descriptor.priority
                )));
            }
        }
        providers.sort_by_key(|provider| provider.descriptor().priority);

        Ok(Self {
            providers,
            fallback: LocalFallbackResponder::new(),
            attempt_timeout,
        })
    }

    pub fn endpoints(&self) -> Vec<EndpointDescriptor> {
        self.providers
            .iter()
            .map(|provider| provider.descriptor().clone())
            .collect()
    }

    /// 总是返回非空回复，远程失败不会向调用方暴露
    pub async fn resolve(&self, request: &ResponseRequest) -> ResolvedResponse {
        let mut resolved = None;

        for provider in &self.providers {
            let outcome = self.attempt(provider.as_ref(), request).await;
            log_attempt(&outcome);

            if let (true, Some(text)) = (outcome.succeeded, outcome.payload) {
                resolved = Some(ResolvedResponse {
                    text,
                    source: ResponseSource::Endpoint(outcome.endpoint_id),
                });
                break;
            }
        }

        match resolved {
            Some(response) => response,
            None => {
                warn!(
                    endpoints = self.providers.len(),
                    "所有远程端点均失败，使用本地兜底回复"
                );
                ResolvedResponse {
                    text: self.fallback.respond(&request.text, request.locale),
                    source: ResponseSource::Fallback,
                }
            }
        }
    }

    async fn attempt(
        &self,
        provider: &dyn ResponseProvider,
        request: &ResponseRequest,
    ) -> AttemptOutcome {
        let endpoint_id = provider.descriptor().id.as_str();
        debug!(endpoint = endpoint_id, "尝试远程端点");

        match tokio::time::timeout(self.attempt_timeout, provider.generate(request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => AttemptOutcome::success(endpoint_id, text),
            Ok(Ok(_)) => AttemptOutcome::failure(endpoint_id, ErrorKind::EmptyPayload),
            Ok(Err(err)) => {
                debug!(endpoint = endpoint_id, error = %err, "远程端点返回错误");
                AttemptOutcome::failure(endpoint_id, err.kind)
            }
            Err(_) => AttemptOutcome::failure(endpoint_id, ErrorKind::Timeout),
        }
    }
}

fn log_attempt(outcome: &AttemptOutcome) {
    match outcome.error_kind {
        None => info!(endpoint = %outcome.endpoint_id, "远程端点调用成功"),
        Some(kind) => warn!(
            endpoint = %outcome.endpoint_id,
            error_kind = %kind,
            "远程端点调用失败，切换到下一个端点"
        ),
    }
}
