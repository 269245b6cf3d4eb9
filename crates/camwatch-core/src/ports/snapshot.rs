//! 스냅샷 저장 포트.
//!
//! 구현: `camwatch-storage` crate (`SnapshotFileStorage`)

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;

use crate::error::CoreError;
use crate::models::motion::{ChangeType, MotionLevel};

/// 스냅샷 저장 요청: 주석 프레임 + 차분 시각화 합성 이미지
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    /// 감지 시각 (파일명에 사용)
    pub timestamp: DateTime<Utc>,
    /// 모션 레벨 (파일명에 사용)
    pub motion_level: MotionLevel,
    /// 변화 원인 (파일명에 사용)
    pub change_type: ChangeType,
    /// JPEG 인코딩된 합성 이미지
    pub jpeg: Vec<u8>,
}

impl SnapshotRequest {
    /// 결정적 파일명: `motion_<YYYYmmdd_HHMMSS>_<level>_<type>.jpg` (로컬 시각)
    pub fn file_name(&self) -> String {
        format!(
            "motion_{}_{}_{}.jpg",
            self.timestamp.with_timezone(&Local).format("%Y%m%d_%H%M%S"),
            self.motion_level.as_str(),
            self.change_type.as_str()
        )
    }
}

/// 스냅샷 저장소
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// 스냅샷 저장 후 파일 경로 반환
    async fn save_snapshot(&self, request: SnapshotRequest) -> Result<PathBuf, CoreError>;
}
