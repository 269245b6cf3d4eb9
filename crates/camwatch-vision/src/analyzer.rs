//! 쿨다운 게이트가 있는 변화 분석기.
//!
//! 분류 시도 사이에 최소 간격(쿨다운)을 강제한다. 쿨다운 중에는 휴리스틱조차
//! 실행하지 않고 `(unknown, "Cooldown active", 0.0)`을 즉시 반환한다.
//! 쿨다운은 분류 호출 "전에" 기록되므로 실패/취소된 외부 호출도 쿨다운을 소모한다.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use camwatch_core::models::motion::ChangeAssessment;

use crate::classifier::ChangeClassifier;
use crate::differencer::FrameDiff;
use crate::heuristic::HeuristicClassifier;

/// 분석기 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerStats {
    /// 1차 분류기 이름
    pub delegate: String,
    pub last_classification: Option<DateTime<Utc>>,
    pub cooldown_secs: u64,
}

/// 변화 분석기: 1차 분류기 + 휴리스틱 폴백 + 쿨다운
pub struct ChangeAnalyzer {
    primary: Arc<dyn ChangeClassifier>,
    fallback: HeuristicClassifier,
    delegating: bool,
    cooldown: StdDuration,
    last_classification: Option<DateTime<Utc>>,
}

impl ChangeAnalyzer {
    /// 휴리스틱만 사용하는 분석기
    pub fn heuristic(heuristic: HeuristicClassifier, cooldown: StdDuration) -> Self {
        let mut analyzer = Self::with_delegate(Arc::new(heuristic), heuristic, cooldown);
        analyzer.delegating = false;
        analyzer
    }

    /// 1차 분류기 실패 시 `fallback` 휴리스틱으로 대체하는 분석기
    pub fn with_delegate(
        primary: Arc<dyn ChangeClassifier>,
        fallback: HeuristicClassifier,
        cooldown: StdDuration,
    ) -> Self {
        info!(
            "ChangeAnalyzer(분류기={}, 쿨다운={}s)",
            primary.name(),
            cooldown.as_secs_f64()
        );
        Self {
            primary,
            fallback,
            delegating: true,
            cooldown,
            last_classification: None,
        }
    }

    /// `now` 기준 쿨다운 중인지 (시계가 뒤로 간 경우도 쿨다운으로 취급)
    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        match self.last_classification {
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed < self.cooldown,
                Err(_) => true,
            },
            None => false,
        }
    }

    /// 현재 시각 기준 분류
    pub async fn classify(&mut self, frame: &RgbImage, diff: &FrameDiff) -> ChangeAssessment {
        self.classify_at(Utc::now(), frame, diff).await
    }

    /// `now` 기준 분류. 실패는 호출자에게 전파되지 않는다.
    pub async fn classify_at(
        &mut self,
        now: DateTime<Utc>,
        frame: &RgbImage,
        diff: &FrameDiff,
    ) -> ChangeAssessment {
        if self.is_cooling_down(now) {
            debug!("분류 쿨다운 중: 건너뜀");
            return ChangeAssessment::cooldown();
        }

        // 호출 전에 기록
        self.last_classification = Some(now);

        match self.primary.classify(frame, diff).await {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!(
                    "{} 분류 실패, 휴리스틱으로 대체: {e}",
                    self.primary.name()
                );
                self.fallback.assess(frame, diff)
            }
        }
    }

    /// 외부 분류기에 위임하는지 (휴리스틱 전용이면 false)
    pub fn is_delegating(&self) -> bool {
        self.delegating
    }

    pub fn stats(&self) -> AnalyzerStats {
        AnalyzerStats {
            delegate: self.primary.name().to_string(),
            last_classification: self.last_classification,
            cooldown_secs: self.cooldown.as_secs(),
        }
    }
}
