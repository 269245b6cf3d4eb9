//! 모션 분석 모델.
//!
//! 모션 레벨, 변화 원인, 변화 영역, 프레임별 이벤트를 정의.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// 모션 레벨: 프레임 중 변화한 픽셀 비율의 서열 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionLevel {
    /// 변화 없음
    None,
    /// 낮은 변화
    Low,
    /// 중간 변화
    Medium,
    /// 높은 변화
    High,
    /// 심각한 변화
    Critical,
}

impl MotionLevel {
    /// 와이어 표현 (소문자)
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionLevel::None => "none",
            MotionLevel::Low => "low",
            MotionLevel::Medium => "medium",
            MotionLevel::High => "high",
            MotionLevel::Critical => "critical",
        }
    }

    /// 사용자 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            MotionLevel::None => "변화 없음",
            MotionLevel::Low => "낮은 변화",
            MotionLevel::Medium => "중간 변화",
            MotionLevel::High => "높은 변화",
            MotionLevel::Critical => "심각한 변화",
        }
    }

    /// 변화 원인 분류가 필요한 레벨인지 (`medium` 이상)
    pub fn requires_classification(&self) -> bool {
        match self {
            MotionLevel::None | MotionLevel::Low => false,
            MotionLevel::Medium | MotionLevel::High | MotionLevel::Critical => true,
        }
    }
}

impl fmt::Display for MotionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 변화 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// 사람
    Person,
    /// 일반 물체 이동
    Object,
    /// 조명 변화
    Light,
    /// 카메라 흔들림 / 센서 노이즈
    Camera,
    /// 판단 불가
    Unknown,
}

impl ChangeType {
    /// 와이어 표현 (소문자)
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Person => "person",
            ChangeType::Object => "object",
            ChangeType::Light => "light",
            ChangeType::Camera => "camera",
            ChangeType::Unknown => "unknown",
        }
    }

    /// 사용자 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            ChangeType::Person => "사람 감지",
            ChangeType::Object => "물체 이동",
            ChangeType::Light => "조명 변화",
            ChangeType::Camera => "카메라 흔들림",
            ChangeType::Unknown => "알 수 없음",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 변화 원인 판정 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAssessment {
    /// 변화 원인
    pub change_type: ChangeType,
    /// 측정값을 포함한 사람이 읽을 수 있는 설명
    pub description: String,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 쿨다운으로 분류를 건너뛴 결과 (와이어에는 나가지 않음)
    #[serde(skip)]
    pub cooled_down: bool,
}

/// 쿨다운 중 반환되는 고정 설명
pub const COOLDOWN_DESCRIPTION: &str = "Cooldown active";

impl ChangeAssessment {
    pub fn new(change_type: ChangeType, description: impl Into<String>, confidence: f64) -> Self {
        Self {
            change_type,
            description: description.into(),
            confidence: confidence.clamp(0.0, 1.0),
            cooled_down: false,
        }
    }

    /// 쿨다운 활성 시 결과 `(unknown, "Cooldown active", 0.0)`
    pub fn cooldown() -> Self {
        Self {
            cooled_down: true,
            ..Self::new(ChangeType::Unknown, COOLDOWN_DESCRIPTION, 0.0)
        }
    }

    /// 쿨다운 결과인지 여부
    pub fn is_cooldown(&self) -> bool {
        self.cooled_down
    }
}

/// 변화 영역 (축 정렬 바운딩 박스 + 실제 변화 픽셀 수)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// 박스 내부의 실제 변화 픽셀 수
    pub area: u32,
}

impl Region {
    /// 바운딩 박스 면적
    pub fn box_area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 채움 밀도 = area / (width × height). 폭/높이가 0이면 0.
    pub fn fill_density(&self) -> f64 {
        let box_area = self.box_area();
        if box_area == 0 {
            return 0.0;
        }
        self.area as f64 / box_area as f64
    }

    /// 종횡비 = width / height. 높이가 0이면 0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// 프레임별 모션 이벤트 (전송 레이어로 소유권 이전)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    /// 스트림 내 프레임 번호 (1부터)
    pub frame_number: u64,
    /// 모션 레벨
    pub motion_level: MotionLevel,
    /// 변화 픽셀 비율 (%), 와이어에서는 소수점 2자리
    #[serde(serialize_with = "round2")]
    pub change_percentage: f64,
    /// 변화 원인 (분류가 수행된 경우만)
    #[serde(default)]
    pub change_type: Option<ChangeType>,
    /// 변화 설명
    #[serde(default)]
    pub description: Option<String>,
    /// 신뢰도 (0.0 ~ 1.0), 와이어에서는 소수점 2자리
    #[serde(serialize_with = "round2")]
    pub confidence: f64,
    /// 처리 시각
    pub timestamp: DateTime<Utc>,
}

impl MotionEvent {
    /// 분류 없이 레벨/비율만 담은 이벤트
    pub fn unclassified(
        frame_number: u64,
        motion_level: MotionLevel,
        change_percentage: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            frame_number,
            motion_level,
            change_percentage,
            change_type: None,
            description: None,
            confidence: 0.0,
            timestamp,
        }
    }

    /// 프레임 처리 실패 시 안전 기본값 (`level=none`, 신뢰도 0)
    pub fn degraded(frame_number: u64, timestamp: DateTime<Utc>) -> Self {
        Self::unclassified(frame_number, MotionLevel::None, 0.0, timestamp)
    }

    /// 분류 결과 첨부
    pub fn with_assessment(mut self, assessment: ChangeAssessment) -> Self {
        self.change_type = Some(assessment.change_type);
        self.description = Some(assessment.description);
        self.confidence = assessment.confidence;
        self
    }

    /// 분류 결과가 포함되어 있는지
    pub fn is_classified(&self) -> bool {
        self.change_type.is_some()
    }
}

/// 프레임마다 전송되는 경량 디버그 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionDebug {
    pub frame_number: u64,
    pub motion_level: MotionLevel,
    #[serde(serialize_with = "round2")]
    pub change_percentage: f64,
    /// 프레임 크기 (`"640x480"`), 디코딩 실패 시 `None`
    #[serde(default)]
    pub frame_size: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MotionDebug {
    pub fn from_event(event: &MotionEvent, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            frame_number: event.frame_number,
            motion_level: event.motion_level,
            change_percentage: event.change_percentage,
            frame_size: dimensions.map(|(w, h)| format!("{w}x{h}")),
            timestamp: event.timestamp,
        }
    }
}

fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&MotionLevel::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(serde_json::to_string(&ChangeType::Light).unwrap(), "\"light\"");
        let level: MotionLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(level, MotionLevel::Medium);
    }

    #[test]
    fn classification_required_above_low() {
        assert!(!MotionLevel::None.requires_classification());
        assert!(!MotionLevel::Low.requires_classification());
        assert!(MotionLevel::Medium.requires_classification());
        assert!(MotionLevel::Critical.requires_classification());
    }

    #[test]
    fn labels() {
        assert_eq!(MotionLevel::None.label(), "변화 없음");
        assert_eq!(ChangeType::Camera.label(), "카메라 흔들림");
        assert_eq!(ChangeType::Person.to_string(), "person");
    }

    #[test]
    fn region_density_guards_zero_box() {
        let region = Region {
            x: 0,
            y: 0,
            width: 0,
            height: 10,
            area: 5,
        };
        assert_eq!(region.fill_density(), 0.0);
        assert_eq!(region.aspect_ratio(), 0.0);
    }

    #[test]
    fn region_density_and_aspect() {
        let region = Region {
            x: 10,
            y: 10,
            width: 40,
            height: 80,
            area: 1600,
        };
        assert!((region.fill_density() - 0.5).abs() < 1e-9);
        assert!((region.aspect_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cooldown_assessment() {
        let a = ChangeAssessment::cooldown();
        assert_eq!(a.change_type, ChangeType::Unknown);
        assert_eq!(a.description, "Cooldown active");
        assert_eq!(a.confidence, 0.0);
        assert!(a.is_cooldown());
    }

    #[test]
    fn cooldown_text_from_classifier_is_not_cooldown() {
        let a = ChangeAssessment::new(ChangeType::Unknown, COOLDOWN_DESCRIPTION, 0.85);
        assert!(!a.is_cooldown());
        assert_ne!(a, ChangeAssessment::cooldown());
    }

    #[test]
    fn event_rounds_on_the_wire() {
        let event = MotionEvent::unclassified(3, MotionLevel::Medium, 2.34567, Utc::now());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["change_percentage"].as_f64().unwrap(), 2.35);
        assert_eq!(value["motion_level"], "medium");
        assert!(value["change_type"].is_null());
    }

    #[test]
    fn degraded_event_is_safe_default() {
        let event = MotionEvent::degraded(7, Utc::now());
        assert_eq!(event.motion_level, MotionLevel::None);
        assert_eq!(event.change_percentage, 0.0);
        assert_eq!(event.confidence, 0.0);
        assert!(!event.is_classified());
    }

    #[test]
    fn debug_record_frame_size() {
        let event = MotionEvent::unclassified(1, MotionLevel::None, 0.0, Utc::now());
        let debug = MotionDebug::from_event(&event, Some((640, 480)));
        assert_eq!(debug.frame_size.as_deref(), Some("640x480"));
    }
}
