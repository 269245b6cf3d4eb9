//! 변화 원인 분류기 trait 및 구현.
//!
//! 로컬 휴리스틱과 외부 비전 서비스 위임은 같은 [`ChangeClassifier`] 인터페이스를
//! 구현하며, 어느 쪽을 쓸지는 설정에 따라 조립 시점에 결정된다.

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tracing::{debug, info};

use camwatch_core::error::CoreError;
use camwatch_core::models::motion::{ChangeAssessment, ChangeType};
use camwatch_core::ports::vision::VisionProvider;

use crate::differencer::FrameDiff;
use crate::encoder::{encode_jpeg, API_JPEG_QUALITY};
use crate::heuristic::HeuristicClassifier;

/// 외부 분류 성공 시 고정 신뢰도
pub const DELEGATE_CONFIDENCE: f64 = 0.85;

/// 카테고리별 키워드 (검사 순서: person → light → camera → object)
const KEYWORD_TABLE: [(ChangeType, &[&str]); 4] = [
    (ChangeType::Person, &["사람", "person", "인물", "남자", "여자"]),
    (ChangeType::Light, &["조명", "light", "밝기", "어두움", "빛"]),
    (ChangeType::Camera, &["흔들림", "shake", "진동", "vibration"]),
    (ChangeType::Object, &["물체", "object", "이동", "movement"]),
];

/// 자연어 설명 → 변화 원인 (대소문자 무시 부분 문자열, 첫 일치 우선)
pub fn classify_description(text: &str) -> ChangeType {
    let lowered = text.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(change_type, _)| *change_type)
        .unwrap_or(ChangeType::Unknown)
}

/// 변화 원인 분류기
#[async_trait]
pub trait ChangeClassifier: Send + Sync {
    /// 현재 프레임과 차분 결과로 변화 원인 추정
    async fn classify(
        &self,
        frame: &RgbImage,
        diff: &FrameDiff,
    ) -> Result<ChangeAssessment, CoreError>;

    /// 분류기 이름 (로그/통계용)
    fn name(&self) -> &str;
}

#[async_trait]
impl ChangeClassifier for HeuristicClassifier {
    async fn classify(
        &self,
        frame: &RgbImage,
        diff: &FrameDiff,
    ) -> Result<ChangeAssessment, CoreError> {
        Ok(self.assess(frame, diff))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// 외부 비전 서비스에 분류를 위임하는 분류기
pub struct DelegatingClassifier {
    provider: Arc<dyn VisionProvider>,
}

impl DelegatingClassifier {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        info!("외부 비전 분류기 사용: {}", provider.provider_name());
        Self { provider }
    }
}

#[async_trait]
impl ChangeClassifier for DelegatingClassifier {
    async fn classify(
        &self,
        frame: &RgbImage,
        _diff: &FrameDiff,
    ) -> Result<ChangeAssessment, CoreError> {
        let jpeg = encode_jpeg(frame, API_JPEG_QUALITY)?;
        let description = self.provider.describe_change(&jpeg).await?;
        let description = description.trim();
        if description.is_empty() {
            return Err(CoreError::Classification(
                "외부 분류기가 빈 설명을 반환".to_string(),
            ));
        }

        let change_type = classify_description(description);
        debug!("외부 분류 결과: {change_type} ← \"{description}\"");
        Ok(ChangeAssessment::new(
            change_type,
            description,
            DELEGATE_CONFIDENCE,
        ))
    }

    fn name(&self) -> &str {
        self.provider.provider_name()
    }
}
