//! 설정 → 파이프라인 조립.

use std::sync::Arc;

use tracing::{error, info, warn};

use camwatch_core::config::AppConfig;
use camwatch_core::error::CoreError;
use camwatch_network::remote_vision::RemoteVisionProvider;
use camwatch_storage::snapshot_storage::SnapshotFileStorage;
use camwatch_vision::analyzer::ChangeAnalyzer;
use camwatch_vision::classifier::DelegatingClassifier;
use camwatch_vision::heuristic::HeuristicClassifier;
use camwatch_vision::pipeline::MotionPipeline;

/// 설정에 맞는 변화 분석기 생성
///
/// 외부 분류가 켜져 있어도 API 키가 없으면 휴리스틱으로 동작한다.
pub fn build_analyzer(config: &AppConfig) -> Result<ChangeAnalyzer, CoreError> {
    let detection = &config.detection;
    let heuristic = HeuristicClassifier::new(detection.coverage_threshold);

    if !detection.enable_ai_analysis {
        info!("외부 분류 비활성화: 로컬 휴리스틱 사용");
        return Ok(ChangeAnalyzer::heuristic(heuristic, detection.cooldown()));
    }

    match config.ai_provider.vision_api.as_ref() {
        Some(endpoint) if config.external_vision_available() => {
            let provider = Arc::new(RemoteVisionProvider::new(endpoint)?);
            let delegate = Arc::new(DelegatingClassifier::new(provider));
            Ok(ChangeAnalyzer::with_delegate(
                delegate,
                heuristic,
                detection.cooldown(),
            ))
        }
        _ => {
            warn!("비전 API 키 미설정: 로컬 휴리스틱 사용");
            Ok(ChangeAnalyzer::heuristic(heuristic, detection.cooldown()))
        }
    }
}

/// 스트림 하나를 처리할 파이프라인 생성
///
/// 스냅샷 디렉토리를 만들 수 없으면 스냅샷 없이 계속한다.
pub async fn build_pipeline(config: &AppConfig) -> Result<MotionPipeline, CoreError> {
    let analyzer = build_analyzer(config)?;
    let pipeline = MotionPipeline::new(&config.detection, analyzer)?;

    if !config.detection.save_snapshots {
        return Ok(pipeline);
    }

    match SnapshotFileStorage::new(config.snapshot.dir.clone()).await {
        Ok(storage) => {
            info!("스냅샷 저장 경로: {}", storage.snapshot_dir().display());
            Ok(pipeline.with_snapshot_sink(Arc::new(storage)))
        }
        Err(e) => {
            error!("스냅샷 저장소 초기화 실패, 스냅샷 비활성화: {e}");
            Ok(pipeline)
        }
    }
}
