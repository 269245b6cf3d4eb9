//! 로컬 휴리스틱 변화 원인 분류.
//!
//! 규칙은 아래 순서로 평가되며 앞선 규칙이 뒤의 규칙을 선점한다.
//!
//! 1. 전체 커버리지 > 20% → `light` (0.85)
//! 2. 평균 밝기 > 190 또는 < 40 → `light` (0.75)
//! 3. 변화 영역 없음 → `unknown` (0.3)
//! 4. 최대 영역 면적 < 1000 → `camera` (0.5)
//! 5. 종횡비 (0.3, 3.0), 면적 > 2000, 채움 밀도 > 0.55 → `person` (0.6)
//! 6. 그 외 → `object` (0.5)

use image::{GrayImage, RgbImage};
use tracing::debug;

use camwatch_core::models::motion::{ChangeAssessment, ChangeType};

use crate::differencer::{binarize, count_nonzero, to_gray, FrameDiff};
use crate::regions::{all_regions, largest};

pub const LIGHT_COVERAGE_RATIO: f64 = 0.20;
pub const LIGHT_COVERAGE_CONFIDENCE: f64 = 0.85;

pub const BRIGHT_LIMIT: f64 = 190.0;
pub const DARK_LIMIT: f64 = 40.0;
pub const BRIGHTNESS_CONFIDENCE: f64 = 0.75;

pub const NO_REGION_CONFIDENCE: f64 = 0.3;

pub const NOISE_AREA_LIMIT: u32 = 1000;
pub const NOISE_CONFIDENCE: f64 = 0.5;

pub const PERSON_MIN_ASPECT: f64 = 0.3;
pub const PERSON_MAX_ASPECT: f64 = 3.0;
pub const PERSON_MIN_AREA: u32 = 2000;
pub const PERSON_MIN_DENSITY: f64 = 0.55;
pub const PERSON_CONFIDENCE: f64 = 0.6;

pub const OBJECT_CONFIDENCE: f64 = 0.5;

/// 흑백 이미지의 평균 밝기 (빈 이미지는 0)
pub fn mean_intensity(gray: &GrayImage) -> f64 {
    let raw = gray.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    raw.iter().map(|&p| p as u64).sum::<u64>() as f64 / raw.len() as f64
}

/// 휴리스틱 분류기 (상태 없음)
#[derive(Debug, Clone, Copy)]
pub struct HeuristicClassifier {
    coverage_threshold: u8,
}

impl HeuristicClassifier {
    /// `coverage_threshold`: 커버리지/영역 계산용 재이진화 임계값 (기본 15)
    pub fn new(coverage_threshold: u8) -> Self {
        Self { coverage_threshold }
    }

    /// 프레임과 차분 결과로 변화 원인 추정
    pub fn assess(&self, frame: &RgbImage, diff: &FrameDiff) -> ChangeAssessment {
        let coverage_mask = binarize(&diff.delta, self.coverage_threshold);
        let total = coverage_mask.width() as u64 * coverage_mask.height() as u64;
        let coverage = if total == 0 {
            0.0
        } else {
            count_nonzero(&coverage_mask) as f64 / total as f64
        };

        if coverage > LIGHT_COVERAGE_RATIO {
            return ChangeAssessment::new(
                ChangeType::Light,
                format!("조명 변화 감지 (변화 범위: {:.1}%)", coverage * 100.0),
                LIGHT_COVERAGE_CONFIDENCE,
            );
        }

        let brightness = mean_intensity(&to_gray(frame));
        if brightness > BRIGHT_LIMIT || brightness < DARK_LIMIT {
            return ChangeAssessment::new(
                ChangeType::Light,
                format!("조명 변화 감지 (밝기: {})", brightness as i64),
                BRIGHTNESS_CONFIDENCE,
            );
        }

        let regions = all_regions(&coverage_mask);
        let Some(biggest) = largest(&regions) else {
            return ChangeAssessment::new(
                ChangeType::Unknown,
                "변화 감지됨 (상세 분석 불가)",
                NO_REGION_CONFIDENCE,
            );
        };

        let area = biggest.area;
        let aspect = biggest.aspect_ratio();
        let density = biggest.fill_density();
        debug!(
            "휴리스틱: 커버리지 {:.3}, 밝기 {:.1}, 영역 {}개, 최대 면적 {area}, 종횡비 {aspect:.2}, 밀도 {density:.2}",
            coverage,
            brightness,
            regions.len()
        );

        if area < NOISE_AREA_LIMIT {
            return ChangeAssessment::new(
                ChangeType::Camera,
                format!("카메라 흔들림 또는 노이즈 (크기: {area})"),
                NOISE_CONFIDENCE,
            );
        }

        if aspect > PERSON_MIN_ASPECT
            && aspect < PERSON_MAX_ASPECT
            && area > PERSON_MIN_AREA
            && density > PERSON_MIN_DENSITY
        {
            return ChangeAssessment::new(
                ChangeType::Person,
                format!("사람 형태 감지 (크기: {area}, 밀도: {density:.2})"),
                PERSON_CONFIDENCE,
            );
        }

        ChangeAssessment::new(
            ChangeType::Object,
            format!("물체 이동 감지 (크기: {area})"),
            OBJECT_CONFIDENCE,
        )
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(15)
    }
}
