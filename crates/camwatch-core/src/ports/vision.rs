//! 외부 비전 분류기 포트.
//!
//! 구현: `camwatch-network` crate (`RemoteVisionProvider`)

use async_trait::async_trait;

use crate::error::CoreError;

/// 외부 비전 분류기: 프레임을 보고 변화 원인을 짧은 자연어로 설명
///
/// 응답 텍스트를 변화 원인으로 매핑하는 것은 호출 측의 책임이다.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// JPEG 인코딩된 프레임을 전송하고 설명 텍스트를 반환
    async fn describe_change(&self, jpeg: &[u8]) -> Result<String, CoreError>;

    /// 제공자 이름 (예: "openai-vision", 모델명 등)
    fn provider_name(&self) -> &str;
}
