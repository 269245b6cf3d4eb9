//! 애플리케이션 설정 구조체.
//!
//! 허브 URL, 모션 감지 파라미터, 외부 비전 API, 스냅샷 저장 경로 등
//! 런타임 설정을 정의한다. `ConfigManager`를 통해 파일/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 카메라 허브 연결 설정
    #[serde(default)]
    pub hub: HubConfig,
    /// 모션 감지 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 외부 비전 API 설정
    #[serde(default)]
    pub ai_provider: AiProviderConfig,
    /// 스냅샷 저장 설정
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self {
            hub: HubConfig::default(),
            detection: DetectionConfig::default(),
            ai_provider: AiProviderConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }

    /// 전체 설정 검증: 스트림 처리 시작 전에 호출
    pub fn validate(&self) -> Result<(), CoreError> {
        self.detection.validate()?;
        if self.hub.url.is_empty() {
            return Err(CoreError::Validation {
                field: "hub.url".to_string(),
                message: "허브 URL이 비어 있음".to_string(),
            });
        }
        Ok(())
    }

    /// 외부 비전 분류를 실제로 사용할 수 있는지 (활성화 + API 키 설정)
    pub fn external_vision_available(&self) -> bool {
        self.detection.enable_ai_analysis
            && self
                .ai_provider
                .vision_api
                .as_ref()
                .is_some_and(|api| !api.api_key.is_empty())
    }
}

// ============================================================
// 허브 설정
// ============================================================

/// 분석기 엔드포인트 경로
pub const ANALYZER_PATH: &str = "/analyzer";

/// 카메라 허브 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// WebSocket 서버 URL (예: "ws://localhost:8887")
    #[serde(default = "default_hub_url")]
    pub url: String,
}

impl HubConfig {
    /// `/analyzer` 경로가 붙은 접속 URL
    pub fn analyzer_url(&self) -> String {
        if self.url.ends_with(ANALYZER_PATH) {
            self.url.clone()
        } else {
            format!("{}{}", self.url.trim_end_matches('/'), ANALYZER_PATH)
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: default_hub_url(),
        }
    }
}

fn default_hub_url() -> String {
    "ws://localhost:8887".to_string()
}

// ============================================================
// 모션 감지 설정
// ============================================================

/// 모션 레벨 구간 경계 (하한 포함, 엄격 증가)
///
/// `< low → none`, `< medium → low`, `< high → medium`, `< critical → high`,
/// 그 외 `critical`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionBands {
    #[serde(default = "default_band_low")]
    pub low: f64,
    #[serde(default = "default_band_medium")]
    pub medium: f64,
    #[serde(default = "default_band_high")]
    pub high: f64,
    #[serde(default = "default_band_critical")]
    pub critical: f64,
}

impl MotionBands {
    /// 경계값 검증: 양수이며 엄격히 증가해야 함
    pub fn validate(&self) -> Result<(), CoreError> {
        let edges = [self.low, self.medium, self.high, self.critical];
        if edges.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(CoreError::Validation {
                field: "detection.bands".to_string(),
                message: format!("경계값은 양수여야 함: {edges:?}"),
            });
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::Validation {
                field: "detection.bands".to_string(),
                message: format!("경계값은 엄격히 증가해야 함: {edges:?}"),
            });
        }
        Ok(())
    }
}

impl Default for MotionBands {
    fn default() -> Self {
        Self {
            low: default_band_low(),
            medium: default_band_medium(),
            high: default_band_high(),
            critical: default_band_critical(),
        }
    }
}

fn default_band_low() -> f64 {
    0.5
}

fn default_band_medium() -> f64 {
    2.0
}

fn default_band_high() -> f64 {
    5.0
}

fn default_band_critical() -> f64 {
    10.0
}

/// 모션 감지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 가우시안 블러 커널 크기 (홀수)
    #[serde(default = "default_blur_size")]
    pub blur_size: u32,
    /// 1차 마스크 이진화 임계값 (픽셀 밝기 차이)
    #[serde(default = "default_diff_threshold")]
    pub diff_threshold: u8,
    /// 조명 판정용 커버리지 이진화 임계값
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: u8,
    /// 시각화/분류 대상 최소 영역 넓이 (픽셀)
    #[serde(default = "default_min_region_area")]
    pub min_region_area: u32,
    /// 모션 레벨 구간 경계
    #[serde(default)]
    pub bands: MotionBands,
    /// 분류 시도 간 최소 간격 (초)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// 외부 비전 분류 사용 여부
    #[serde(default = "default_true")]
    pub enable_ai_analysis: bool,
    /// 분류된 이벤트의 스냅샷 저장 여부
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
}

impl DetectionConfig {
    /// 분류 쿨다운
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// 설정 검증: 잘못된 커널 크기/임계값은 즉시 실패
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.blur_size == 0 || self.blur_size % 2 == 0 {
            return Err(CoreError::Validation {
                field: "detection.blur_size".to_string(),
                message: format!("양의 홀수여야 함 (현재 {})", self.blur_size),
            });
        }
        if self.diff_threshold == 0 {
            return Err(CoreError::Validation {
                field: "detection.diff_threshold".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.coverage_threshold == 0 {
            return Err(CoreError::Validation {
                field: "detection.coverage_threshold".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        self.bands.validate()
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blur_size: default_blur_size(),
            diff_threshold: default_diff_threshold(),
            coverage_threshold: default_coverage_threshold(),
            min_region_area: default_min_region_area(),
            bands: MotionBands::default(),
            cooldown_secs: default_cooldown_secs(),
            enable_ai_analysis: true,
            save_snapshots: true,
        }
    }
}

fn default_blur_size() -> u32 {
    21
}

fn default_diff_threshold() -> u8 {
    25
}

fn default_coverage_threshold() -> u8 {
    15
}

fn default_min_region_area() -> u32 {
    500
}

fn default_cooldown_secs() -> u64 {
    3
}

// ============================================================
// AI 제공자 설정
// ============================================================

/// AI 제공자 설정: 외부 비전 API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiProviderConfig {
    /// 외부 비전 API 설정 (없으면 로컬 휴리스틱만 사용)
    #[serde(default)]
    pub vision_api: Option<ExternalApiEndpoint>,
}

/// AI API 제공자 타입: URL 문자열 매칭 대신 명시적 enum으로 제공자 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderType {
    /// Anthropic Claude API: `x-api-key` 헤더 + `/v1/messages` 형식
    Anthropic,
    /// OpenAI 호환 API: `Authorization: Bearer` 헤더 + `/v1/chat/completions` 형식
    #[default]
    OpenAi,
    /// 기타 제공자: OpenAI 호환 요청, Bearer 토큰 인증
    Generic,
}

/// 외부 AI API 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalApiEndpoint {
    /// API URL (예: "https://api.openai.com/v1/chat/completions")
    pub endpoint: String,
    /// API 키 (로컬 config.json 또는 `OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름
    pub model: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
    /// AI 제공자 타입: 요청/응답 형식 및 인증 헤더 결정에 사용
    #[serde(default)]
    pub provider_type: AiProviderType,
}

impl ExternalApiEndpoint {
    /// OpenAI Chat Completions 기본 엔드포인트
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: api_key.into(),
            model: None,
            timeout_secs: default_api_timeout_secs(),
            provider_type: AiProviderType::OpenAi,
        }
    }
}

fn default_api_timeout_secs() -> u64 {
    30
}

// ============================================================
// 스냅샷 설정
// ============================================================

/// 스냅샷 저장 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// 저장 디렉토리
    #[serde(default = "default_snapshot_dir")]
    pub dir: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("./snapshots")
}

fn default_true() -> bool {
    true
}
