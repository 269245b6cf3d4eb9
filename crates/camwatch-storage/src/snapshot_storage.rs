//! 스냅샷 파일 저장소.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use camwatch_core::error::CoreError;
use camwatch_core::ports::snapshot::{SnapshotRequest, SnapshotSink};

/// 스냅샷 파일 저장소
///
/// 구조: `<dir>/motion_<YYYYmmdd_HHMMSS>_<level>_<type>.jpg`
///
/// 같은 초에 같은 레벨/원인으로 저장되면 파일을 덮어쓴다.
pub struct SnapshotFileStorage {
    dir: PathBuf,
}

impl SnapshotFileStorage {
    /// 새 스냅샷 저장소 생성 (디렉토리가 없으면 생성)
    pub async fn new(dir: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Internal(format!("스냅샷 디렉토리 생성 실패: {e}")))?;

        info!("스냅샷 저장소 초기화: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotSink for SnapshotFileStorage {
    async fn save_snapshot(&self, request: SnapshotRequest) -> Result<PathBuf, CoreError> {
        // 실행 중 디렉토리가 삭제된 경우 대비
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::Internal(format!("스냅샷 디렉토리 생성 실패: {e}")))?;

        let path = self.dir.join(request.file_name());
        fs::write(&path, &request.jpeg)
            .await
            .map_err(|e| CoreError::Internal(format!("스냅샷 파일 저장 실패: {e}")))?;

        debug!(
            "스냅샷 저장: {} ({}bytes)",
            path.display(),
            request.jpeg.len()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camwatch_core::models::motion::{ChangeType, MotionLevel};
    use chrono::{Local, TimeZone, Utc};
    use tempfile::TempDir;

    fn request(level: MotionLevel, change_type: ChangeType) -> SnapshotRequest {
        let timestamp = Local
            .with_ymd_and_hms(2026, 2, 19, 14, 5, 9)
            .unwrap()
            .with_timezone(&Utc);
        SnapshotRequest {
            timestamp,
            motion_level: level,
            change_type,
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    #[tokio::test]
    async fn creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("snapshots");
        let storage = SnapshotFileStorage::new(dir.clone()).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(storage.snapshot_dir(), dir.as_path());
    }

    #[tokio::test]
    async fn save_uses_deterministic_name() {
        let temp = TempDir::new().unwrap();
        let storage = SnapshotFileStorage::new(temp.path().to_path_buf())
            .await
            .unwrap();

        let path = storage
            .save_snapshot(request(MotionLevel::High, ChangeType::Person))
            .await
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "motion_20260219_140509_high_person.jpg"
        );
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[tokio::test]
    async fn distinct_events_get_distinct_files() {
        let temp = TempDir::new().unwrap();
        let storage = SnapshotFileStorage::new(temp.path().to_path_buf())
            .await
            .unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"x").unwrap();

        storage
            .save_snapshot(request(MotionLevel::Medium, ChangeType::Light))
            .await
            .unwrap();
        storage
            .save_snapshot(request(MotionLevel::Critical, ChangeType::Object))
            .await
            .unwrap();

        let files: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jpg"))
            .collect();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn recreates_directory_if_removed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("snaps");
        let storage = SnapshotFileStorage::new(dir.clone()).await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        let path = storage
            .save_snapshot(request(MotionLevel::High, ChangeType::Camera))
            .await
            .unwrap();
        assert!(path.exists());
    }
}
