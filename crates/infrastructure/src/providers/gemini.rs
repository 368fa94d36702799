use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use relay_config::EndpointConfig;
use relay_domain::{
    EndpointDescriptor, Locale, ProviderError, ResponseProvider, ResponseRequest,
};

const SYSTEM_PROMPT_EN: &str = "You are an AI assistant for The Samurai, a cybersecurity and IT solutions company in Saudi Arabia. Respond briefly, professionally and friendly.";
const SYSTEM_PROMPT_AR: &str = "أنت مساعد ذكي لشركة The Samurai المتخصصة في الأمن السيبراني وحلول تكنولوجيا المعلومات في المملكة العربية السعودية. أجب بإيجاز وبشكل محترف وودود.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Gemini generateContent 端点
pub struct GeminiProvider {
    descriptor: EndpointDescriptor,
    url: String,
    api_key: String,
    max_output_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        endpoint: &EndpointConfig,
        api_key: &str,
        max_output_tokens: u32,
        temperature: f32,
        client: reqwest::Client,
    ) -> Self {
        Self {
            descriptor: EndpointDescriptor {
                id: endpoint.id.clone(),
                priority: endpoint.priority,
            },
            url: endpoint.url.clone(),
            api_key: api_key.to_string(),
            max_output_tokens,
            temperature,
            client,
        }
    }

    fn build_request(&self, request: &ResponseRequest) -> GenerateContentRequest {
        let system_prompt = match request.locale {
            Locale::Primary => SYSTEM_PROMPT_EN,
            Locale::Secondary => SYSTEM_PROMPT_AR,
        };
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(format!("{system_prompt}\n\nUser: {}", request.text)),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            },
        }
    }
}

fn classify_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

fn extract_text(body: &[u8]) -> Option<String> {
    let parsed: GenerateContentResponse = serde_json::from_slice(body).ok()?;
    parsed
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()?
        .text
        .filter(|text| !text.trim().is_empty())
}

#[async_trait]
impl ResponseProvider for GeminiProvider {
    fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    async fn generate(&self, request: &ResponseRequest) -> Result<String, ProviderError> {
        let body = self.build_request(request);

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(classify_send_error)?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorEnvelope>(&bytes)
                .map(|envelope| envelope.error.message)
                .unwrap_or_default();
            debug!(endpoint = %self.descriptor.id, %status, detail = %detail, "端点返回非成功状态");
            return Err(ProviderError::status(format!("HTTP {status}: {detail}")));
        }

        extract_text(&bytes).ok_or_else(|| {
            ProviderError::empty_payload(format!(
                "endpoint {} returned no usable text",
                self.descriptor.id
            ))
        })
    }
}
