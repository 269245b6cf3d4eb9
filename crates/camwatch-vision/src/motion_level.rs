//! 변화 비율 → 모션 레벨.

use camwatch_core::config::MotionBands;
use camwatch_core::error::CoreError;
use camwatch_core::models::motion::MotionLevel;

/// 모션 레벨 분류기 (상태 없음, 하한 포함 구간)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionLevelClassifier {
    bands: MotionBands,
}

impl MotionLevelClassifier {
    pub fn new(bands: MotionBands) -> Result<Self, CoreError> {
        bands.validate()?;
        Ok(Self { bands })
    }

    /// `pct`가 정확히 경계값이면 위쪽 레벨 (0.5 → low)
    pub fn level(&self, pct: f64) -> MotionLevel {
        let b = &self.bands;
        if pct.is_nan() || pct < b.low {
            MotionLevel::None
        } else if pct < b.medium {
            MotionLevel::Low
        } else if pct < b.high {
            MotionLevel::Medium
        } else if pct < b.critical {
            MotionLevel::High
        } else {
            MotionLevel::Critical
        }
    }
}
