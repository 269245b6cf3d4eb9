//! 외부 비전 API 클라이언트.
//!
//! 변화가 감지된 프레임(JPEG)을 외부 Vision API에 보내고
//! 변화 원인에 대한 짧은 자연어 설명을 받는다.

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::RETRY_AFTER;
use tracing::{debug, warn};

use camwatch_core::config::{AiProviderType, ExternalApiEndpoint};
use camwatch_core::error::CoreError;
use camwatch_core::ports::vision::VisionProvider;

/// 변화 원인 설명 요청 프롬프트
pub const CHANGE_PROMPT: &str = "이 이미지에서 어떤 변화가 감지되었습니다. 변화의 원인을 간단히 설명해주세요. (사람, 물체, 조명 변화, 카메라 흔들림 등)";

/// 응답 최대 토큰 (짧은 설명만 필요)
pub const MAX_TOKENS: u32 = 100;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// 429 응답에 Retry-After가 없을 때 기본 대기 시간
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 외부 비전 API 클라이언트
///
/// 지원 API:
/// - Claude (Anthropic): `POST /v1/messages` + image content block
/// - OpenAI 호환: `POST /v1/chat/completions` + `image_url` data URL
#[derive(Debug)]
pub struct RemoteVisionProvider {
    http_client: reqwest::Client,
    endpoint: String,
    /// API 키 (메모리에만 유지)
    api_key: String,
    model: String,
    provider_type: AiProviderType,
}

impl RemoteVisionProvider {
    pub fn new(config: &ExternalApiEndpoint) -> Result<Self, CoreError> {
        if config.api_key.is_empty() {
            return Err(CoreError::Config(
                "비전 API 키 미설정. config.json 또는 OPENAI_API_KEY를 확인하세요.".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        let model = config.model.clone().unwrap_or_else(|| {
            match config.provider_type {
                AiProviderType::Anthropic => DEFAULT_ANTHROPIC_MODEL,
                AiProviderType::OpenAi | AiProviderType::Generic => DEFAULT_OPENAI_MODEL,
            }
            .to_string()
        });

        debug!(
            endpoint = %config.endpoint,
            model = %model,
            timeout = config.timeout_secs,
            "RemoteVisionProvider 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model,
            provider_type: config.provider_type,
        })
    }

    fn is_anthropic(&self) -> bool {
        self.provider_type == AiProviderType::Anthropic
    }

    fn build_request(&self, encoded: &str) -> serde_json::Value {
        if self.is_anthropic() {
            serde_json::json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": "image/jpeg",
                                "data": encoded
                            }
                        },
                        { "type": "text", "text": CHANGE_PROMPT }
                    ]
                }]
            })
        } else {
            serde_json::json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text", "text": CHANGE_PROMPT },
                        {
                            "type": "image_url",
                            "image_url": { "url": format!("data:image/jpeg;base64,{encoded}") }
                        }
                    ]
                }]
            })
        }
    }

    /// Claude 응답: `content[].text`를 이어 붙인다
    fn parse_anthropic_response(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::Classification(format!("응답 JSON 파싱 실패: {e}")))?;

        let text: Vec<&str> = response
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CoreError::Classification(
                "Claude 응답에서 텍스트를 찾을 수 없음".to_string(),
            ));
        }
        Ok(text.join("\n").trim().to_string())
    }

    /// OpenAI 응답: `choices[0].message.content`
    fn parse_openai_response(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::Classification(format!("응답 JSON 파싱 실패: {e}")))?;

        response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .map(|t| t.trim().to_string())
            .ok_or_else(|| {
                CoreError::Classification("OpenAI 응답에서 텍스트를 찾을 수 없음".to_string())
            })
    }

    /// 비정상 상태 코드 → 에러 매핑
    fn status_error(status: reqwest::StatusCode, retry_after: Option<u64>, body: &str) -> CoreError {
        let snippet: String = body.chars().take(200).collect();
        match status.as_u16() {
            429 => CoreError::RateLimit {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            503 => CoreError::ServiceUnavailable(snippet),
            _ => CoreError::Classification(format!("비전 API 오류 ({status}): {snippet}")),
        }
    }
}

#[async_trait]
impl VisionProvider for RemoteVisionProvider {
    async fn describe_change(&self, jpeg: &[u8]) -> Result<String, CoreError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
        let request_body = self.build_request(&encoded);

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            image_size = jpeg.len(),
            "외부 비전 API 호출"
        );

        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body);

        if self.is_anthropic() {
            builder = builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION);
        } else {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("비전 API 호출 실패: {e}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("비전 API 응답 읽기 실패: {e}")))?;

        if !status.is_success() {
            warn!(status = %status, "비전 API 오류 응답");
            return Err(Self::status_error(status, retry_after, &body));
        }

        let description = if self.is_anthropic() {
            Self::parse_anthropic_response(&body)?
        } else {
            Self::parse_openai_response(&body)?
        };

        debug!(description = %description, "비전 API 응답 수신");
        Ok(description)
    }

    fn provider_name(&self) -> &str {
        &self.model
    }
}
