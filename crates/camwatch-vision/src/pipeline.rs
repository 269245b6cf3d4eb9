//! 모션 파이프라인: 스트림당 하나의 인스턴스.
//!
//! 매 프레임: 차분 → 모션 레벨 → (medium 이상이면) 변화 원인 분류 → 이벤트.
//! 프레임 단위 실패는 스트림을 중단시키지 않고 안전 기본값 이벤트로 대체된다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use camwatch_core::config::DetectionConfig;
use camwatch_core::error::CoreError;
use camwatch_core::models::motion::{ChangeAssessment, MotionDebug, MotionEvent, MotionLevel};
use camwatch_core::ports::snapshot::{SnapshotRequest, SnapshotSink};

use crate::analyzer::ChangeAnalyzer;
use crate::annotate::render_snapshot;
use crate::differencer::{FrameDiff, FrameDifferencer};
use crate::encoder::{encode_jpeg, SNAPSHOT_JPEG_QUALITY};
use crate::frame::Frame;
use crate::motion_level::MotionLevelClassifier;
use crate::regions::extract_regions;

/// 파이프라인 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub frame_count: u64,
    pub has_reference: bool,
    pub blur_size: u32,
    pub ai_enabled: bool,
    pub last_classification: Option<DateTime<Utc>>,
    pub cooldown_secs: u64,
}

/// 인코딩된 프레임 처리 결과
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub event: MotionEvent,
    /// 디코딩된 프레임 크기 (디코딩 실패 시 None)
    pub frame_size: Option<(u32, u32)>,
}

impl ProcessedFrame {
    /// 매 프레임 전송하는 디버그 레코드
    pub fn debug_record(&self) -> MotionDebug {
        MotionDebug::from_event(&self.event, self.frame_size)
    }
}

/// 모션 파이프라인
pub struct MotionPipeline {
    differencer: FrameDifferencer,
    levels: MotionLevelClassifier,
    analyzer: ChangeAnalyzer,
    snapshots: Option<Arc<dyn SnapshotSink>>,
    min_region_area: u32,
    frame_count: u64,
}

impl MotionPipeline {
    /// 설정 검증 후 생성. 잘못된 설정은 스트림 시작 전에 실패한다.
    pub fn new(config: &DetectionConfig, analyzer: ChangeAnalyzer) -> Result<Self, CoreError> {
        config.validate()?;
        let differencer = FrameDifferencer::new(config.blur_size, config.diff_threshold)?;
        let levels = MotionLevelClassifier::new(config.bands)?;

        info!(
            "MotionPipeline 초기화 (최소 영역 {}px, 분류기 {})",
            config.min_region_area,
            analyzer.stats().delegate
        );

        Ok(Self {
            differencer,
            levels,
            analyzer,
            snapshots: None,
            min_region_area: config.min_region_area,
            frame_count: 0,
        })
    }

    /// 분류된 프레임의 스냅샷을 저장할 저장소 연결
    pub fn with_snapshot_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshots = Some(sink);
        self
    }

    /// 인코딩된 프레임 버퍼 처리. 디코딩 실패는 `level=none` 이벤트가 된다.
    pub async fn process_encoded(
        &mut self,
        bytes: &[u8],
        received_at: DateTime<Utc>,
    ) -> ProcessedFrame {
        match Frame::decode(bytes, received_at) {
            Ok(frame) => {
                let frame_size = Some(frame.dimensions());
                let event = self.process(&frame).await;
                ProcessedFrame { event, frame_size }
            }
            Err(e) => {
                self.frame_count += 1;
                warn!("프레임 #{} 디코딩 실패, 건너뜀: {e}", self.frame_count);
                ProcessedFrame {
                    event: MotionEvent::degraded(self.frame_count, received_at),
                    frame_size: None,
                }
            }
        }
    }

    /// 프레임 하나 처리
    pub async fn process(&mut self, frame: &Frame) -> MotionEvent {
        self.frame_count += 1;
        let frame_number = self.frame_count;
        let timestamp = frame.received_at();

        let diff = match self.differencer.diff(frame.image()) {
            Ok(diff) => diff,
            Err(e) => {
                warn!("프레임 #{frame_number} 차분 실패: {e}");
                return MotionEvent::degraded(frame_number, timestamp);
            }
        };

        if diff.is_first_frame {
            return MotionEvent::unclassified(frame_number, MotionLevel::None, 0.0, timestamp);
        }

        let level = self.levels.level(diff.change_percentage);
        let event =
            MotionEvent::unclassified(frame_number, level, diff.change_percentage, timestamp);
        if !level.requires_classification() {
            return event;
        }

        let assessment = self.analyzer.classify(frame.image(), &diff).await;
        debug!(
            "프레임 #{frame_number}: {level} {:.2}% → {} ({:.2})",
            diff.change_percentage, assessment.change_type, assessment.confidence
        );

        if !assessment.is_cooldown() {
            self.save_snapshot(frame, &diff, level, &assessment).await;
        }

        event.with_assessment(assessment)
    }

    async fn save_snapshot(
        &self,
        frame: &Frame,
        diff: &FrameDiff,
        level: MotionLevel,
        assessment: &ChangeAssessment,
    ) {
        let Some(sink) = self.snapshots.as_ref() else {
            return;
        };

        let regions = extract_regions(&diff.mask, self.min_region_area);
        let composite = render_snapshot(
            frame.image(),
            &diff.delta,
            &regions,
            assessment.change_type,
        );
        let jpeg = match encode_jpeg(&composite, SNAPSHOT_JPEG_QUALITY) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                error!("스냅샷 인코딩 실패: {e}");
                return;
            }
        };

        let request = SnapshotRequest {
            timestamp: frame.received_at(),
            motion_level: level,
            change_type: assessment.change_type,
            jpeg,
        };
        if let Err(e) = sink.save_snapshot(request).await {
            error!("스냅샷 저장 실패: {e}");
        }
    }

    /// 참조 프레임과 프레임 카운터 초기화 (분류 쿨다운은 유지)
    pub fn reset(&mut self) {
        self.differencer.reset();
        self.frame_count = 0;
        info!("MotionPipeline 초기화됨");
    }

    pub fn stats(&self) -> PipelineStats {
        let analyzer = self.analyzer.stats();
        PipelineStats {
            frame_count: self.frame_count,
            has_reference: self.differencer.has_reference(),
            blur_size: self.differencer.blur_size(),
            ai_enabled: self.analyzer.is_delegating(),
            last_classification: analyzer.last_classification,
            cooldown_secs: analyzer.cooldown_secs,
        }
    }
}
