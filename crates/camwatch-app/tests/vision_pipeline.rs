//! 크레이트 간 통합 테스트: 파이프라인 + 외부 비전 API + 스냅샷 저장소.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use camwatch_core::config::{AiProviderType, DetectionConfig, ExternalApiEndpoint};
use camwatch_core::models::motion::{ChangeType, MotionLevel};
use camwatch_network::remote_vision::RemoteVisionProvider;
use camwatch_storage::snapshot_storage::SnapshotFileStorage;
use camwatch_vision::analyzer::ChangeAnalyzer;
use camwatch_vision::classifier::DelegatingClassifier;
use camwatch_vision::frame::Frame;
use camwatch_vision::heuristic::HeuristicClassifier;
use camwatch_vision::pipeline::MotionPipeline;

const W: u32 = 200;
const H: u32 = 150;

fn gray() -> Frame {
    Frame::new(RgbImage::from_pixel(W, H, Rgb([120, 120, 120])), Utc::now())
}

fn gray_with_square() -> Frame {
    let mut img = RgbImage::from_pixel(W, H, Rgb([120, 120, 120]));
    for y in 50..100 {
        for x in 75..125 {
            img.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    Frame::new(img, Utc::now())
}

fn endpoint(url: String) -> ExternalApiEndpoint {
    ExternalApiEndpoint {
        endpoint: url,
        api_key: "test-api-key-placeholder".to_string(),
        model: Some("gpt-4o".to_string()),
        timeout_secs: 5,
        provider_type: AiProviderType::OpenAi,
    }
}

fn delegating_pipeline(url: String) -> MotionPipeline {
    let config = DetectionConfig::default();
    let provider = Arc::new(RemoteVisionProvider::new(&endpoint(url)).unwrap());
    let analyzer = ChangeAnalyzer::with_delegate(
        Arc::new(DelegatingClassifier::new(provider)),
        HeuristicClassifier::new(config.coverage_threshold),
        config.cooldown(),
    );
    MotionPipeline::new(&config, analyzer).unwrap()
}

#[tokio::test]
async fn remote_description_drives_change_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"  화면 중앙에 사람이 나타났습니다  "}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let mut pipeline = delegating_pipeline(format!("{}/v1/chat/completions", server.url()));
    pipeline.process(&gray()).await;
    let event = pipeline.process(&gray_with_square()).await;

    assert!(event.motion_level >= MotionLevel::Medium);
    assert_eq!(event.change_type, Some(ChangeType::Person));
    assert_eq!(
        event.description.as_deref(),
        Some("화면 중앙에 사람이 나타났습니다")
    );
    assert_eq!(event.confidence, 0.85);
    assert!(pipeline.stats().ai_enabled);
    mock.assert_async().await;
}

#[tokio::test]
async fn unavailable_service_falls_back_to_heuristic() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("maintenance")
        .expect(1)
        .create_async()
        .await;

    let mut pipeline = delegating_pipeline(format!("{}/v1/chat/completions", server.url()));
    pipeline.process(&gray()).await;
    let event = pipeline.process(&gray_with_square()).await;

    assert_eq!(event.change_type, Some(ChangeType::Person));
    assert_eq!(event.confidence, 0.6);
    assert!(pipeline.stats().last_classification.is_some());

    // 실패한 호출도 쿨다운을 시작시켜 바로 다음 프레임은 재시도하지 않음
    let event = pipeline.process(&gray()).await;
    assert_eq!(event.description.as_deref(), Some("Cooldown active"));
    mock.assert_async().await;
}

#[tokio::test]
async fn snapshots_written_to_disk() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("snapshots");
    let storage = SnapshotFileStorage::new(dir.clone()).await.unwrap();

    let config = DetectionConfig::default();
    let analyzer = ChangeAnalyzer::heuristic(
        HeuristicClassifier::new(config.coverage_threshold),
        Duration::ZERO,
    );
    let mut pipeline = MotionPipeline::new(&config, analyzer)
        .unwrap()
        .with_snapshot_sink(Arc::new(storage));

    pipeline.process(&gray()).await;
    let event = pipeline.process(&gray_with_square()).await;
    assert_eq!(event.change_type, Some(ChangeType::Person));

    let files: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);

    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("motion_"));
    assert!(name.ends_with("_person.jpg"));

    let composite = image::open(&files[0]).unwrap();
    assert_eq!((composite.width(), composite.height()), (W * 2, H));
}

#[tokio::test]
async fn encoded_stream_round_trip() {
    let config = DetectionConfig::default();
    let analyzer = ChangeAnalyzer::heuristic(
        HeuristicClassifier::new(config.coverage_threshold),
        config.cooldown(),
    );
    let mut pipeline = MotionPipeline::new(&config, analyzer).unwrap();

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
        .encode_image(gray().image())
        .unwrap();

    let first = pipeline.process_encoded(&jpeg, Utc::now()).await;
    let second = pipeline.process_encoded(&jpeg, Utc::now()).await;
    let broken = pipeline.process_encoded(b"not a jpeg", Utc::now()).await;

    assert_eq!(first.event.motion_level, MotionLevel::None);
    assert_eq!(second.event.motion_level, MotionLevel::None);
    assert_eq!(second.debug_record().frame_size.as_deref(), Some("200x150"));
    assert_eq!(broken.event.frame_number, 3);
    assert_eq!(broken.event.motion_level, MotionLevel::None);
    assert!(broken.frame_size.is_none());
}
