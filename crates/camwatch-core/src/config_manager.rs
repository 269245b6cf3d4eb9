//! 설정 파일 관리.
//!
//! JSON 설정 파일을 저장/로드하고, 배포 환경에서 쓰던 환경변수
//! (`BLUR_SIZE`, `ENABLE_AI`, `OPENAI_API_KEY` 등)를 파일 설정 위에 덮어쓴다.

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{AiProviderType, AppConfig, ExternalApiEndpoint};
use crate::error::CoreError;

/// 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 설정 관리자
///
/// 설정 파일의 로드/저장 및 런타임 설정 변경을 관리한다.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 현재 설정 (스레드 안전)
    config: Arc<RwLock<AppConfig>>,
    /// 설정 파일 경로
    config_path: PathBuf,
}

impl ConfigManager {
    /// 지정된 경로로 설정 관리자 생성
    ///
    /// 설정 파일이 없으면 기본 설정을 생성하고 저장한다.
    pub fn with_path(config_path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Config(format!(
                        "설정 디렉토리 생성 실패: {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                info!("설정 디렉토리 생성: {}", parent.display());
            }
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default_config();
            Self::save_to_file(&config_path, &default_config)?;
            info!("기본 설정 파일 생성: {}", config_path.display());
            default_config
        };

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// 설정 파일 경로
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 프로세스 환경변수를 현재 설정(메모리)에 덮어쓴다. 파일은 건드리지 않는다.
    pub fn apply_process_env(&self) -> Result<AppConfig, CoreError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// 주입된 조회 함수로 환경변수 오버라이드 적용
    pub fn apply_env_with<F>(&self, lookup: F) -> Result<AppConfig, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.get();
        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;
        *self.config.write() = config.clone();
        Ok(config)
    }

    /// 파일에서 설정 로드
    fn load_from_file(path: &Path) -> Result<AppConfig, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 파일에 설정 저장
    fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

/// 환경변수 오버라이드 적용
///
/// | 변수 | 대상 |
/// |---|---|
/// | `BLUR_SIZE` | `detection.blur_size` |
/// | `MIN_CONTOUR_AREA` | `detection.min_region_area` |
/// | `ENABLE_AI` | `detection.enable_ai_analysis` (`"true"`만 참) |
/// | `AI_COOLDOWN` | `detection.cooldown_secs` |
/// | `SAVE_SNAPSHOTS` | `detection.save_snapshots` (`"true"`만 참) |
/// | `SNAPSHOT_DIR` | `snapshot.dir` |
/// | `WEBSOCKET_SERVER` | `hub.url` |
/// | `OPENAI_API_KEY` | `ai_provider.vision_api.api_key` (없으면 OpenAI 기본 엔드포인트 생성, Anthropic 엔드포인트에는 적용 안 함) |
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BLUR_SIZE") {
        config.detection.blur_size = parse_env("BLUR_SIZE", &v)?;
    }
    if let Some(v) = lookup("MIN_CONTOUR_AREA") {
        config.detection.min_region_area = parse_env("MIN_CONTOUR_AREA", &v)?;
    }
    if let Some(v) = lookup("ENABLE_AI") {
        config.detection.enable_ai_analysis = v.eq_ignore_ascii_case("true");
    }
    if let Some(v) = lookup("AI_COOLDOWN") {
        config.detection.cooldown_secs = parse_env("AI_COOLDOWN", &v)?;
    }
    if let Some(v) = lookup("SAVE_SNAPSHOTS") {
        config.detection.save_snapshots = v.eq_ignore_ascii_case("true");
    }
    if let Some(v) = lookup("SNAPSHOT_DIR") {
        config.snapshot.dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("WEBSOCKET_SERVER") {
        config.hub.url = v;
    }
    if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
        match config.ai_provider.vision_api.as_mut() {
            Some(api) if api.provider_type == AiProviderType::Anthropic => {
                warn!("OPENAI_API_KEY 무시: 비전 API가 Anthropic으로 설정됨");
            }
            Some(api) => api.api_key = key,
            None => config.ai_provider.vision_api = Some(ExternalApiEndpoint::openai(key)),
        }
    }
    if lookup("MOTION_THRESHOLD").is_some() {
        warn!("MOTION_THRESHOLD는 더 이상 사용되지 않음: 모션 레벨 구간(detection.bands)을 설정하세요");
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("환경변수 {key} 값이 올바르지 않음: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn create_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let manager = ConfigManager::with_path(config_path.clone()).unwrap();
        assert!(config_path.exists());
        assert_eq!(manager.get().detection.blur_size, 21);
    }

    #[test]
    fn existing_file_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut config = AppConfig::default_config();
        config.detection.blur_size = 15;
        config.detection.min_region_area = 777;
        fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let manager = ConfigManager::with_path(config_path).unwrap();
        let loaded = manager.get();
        assert_eq!(loaded.detection.blur_size, 15);
        assert_eq!(loaded.detection.min_region_area, 777);
    }

    #[test]
    fn defaults_written_to_missing_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        ConfigManager::with_path(config_path.clone()).unwrap();
        let content = fs::read_to_string(&config_path).unwrap();
        let saved: AppConfig = serde_json::from_str(&content).unwrap();
        assert_eq!(saved.detection.blur_size, 21);
        assert_eq!(saved.hub.url, AppConfig::default_config().hub.url);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ not json").unwrap();

        let err = ConfigManager::with_path(config_path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default_config();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("BLUR_SIZE", "15"),
                ("MIN_CONTOUR_AREA", "800"),
                ("ENABLE_AI", "FALSE"),
                ("AI_COOLDOWN", "5"),
                ("SAVE_SNAPSHOTS", "true"),
                ("SNAPSHOT_DIR", "/tmp/snaps"),
                ("WEBSOCKET_SERVER", "ws://hub:9000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.detection.blur_size, 15);
        assert_eq!(config.detection.min_region_area, 800);
        assert!(!config.detection.enable_ai_analysis);
        assert_eq!(config.detection.cooldown_secs, 5);
        assert!(config.detection.save_snapshots);
        assert_eq!(config.snapshot.dir, PathBuf::from("/tmp/snaps"));
        assert_eq!(config.hub.url, "ws://hub:9000");
    }

    #[test]
    fn api_key_env_creates_endpoint() {
        let mut config = AppConfig::default_config();
        apply_env_overrides(&mut config, lookup_from(&[("OPENAI_API_KEY", "sk-abc")])).unwrap();

        let api = config.ai_provider.vision_api.unwrap();
        assert_eq!(api.api_key, "sk-abc");
        assert!(api.endpoint.contains("chat/completions"));
    }

    #[test]
    fn openai_key_does_not_replace_anthropic_key() {
        let mut config = AppConfig::default_config();
        config.ai_provider.vision_api = Some(ExternalApiEndpoint {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            api_key: "anthropic-key".to_string(),
            model: None,
            timeout_secs: 30,
            provider_type: AiProviderType::Anthropic,
        });
        apply_env_overrides(&mut config, lookup_from(&[("OPENAI_API_KEY", "sk-abc")])).unwrap();

        let api = config.ai_provider.vision_api.unwrap();
        assert_eq!(api.api_key, "anthropic-key");
        assert_eq!(api.provider_type, AiProviderType::Anthropic);
    }

    #[test]
    fn openai_key_replaces_existing_openai_key() {
        let mut config = AppConfig::default_config();
        config.ai_provider.vision_api = Some(ExternalApiEndpoint::openai("old".to_string()));
        apply_env_overrides(&mut config, lookup_from(&[("OPENAI_API_KEY", "sk-new")])).unwrap();

        assert_eq!(config.ai_provider.vision_api.unwrap().api_key, "sk-new");
    }

    #[test]
    fn malformed_numeric_env_rejected() {
        let mut config = AppConfig::default_config();
        let err = apply_env_overrides(&mut config, lookup_from(&[("BLUR_SIZE", "abc")]))
            .unwrap_err();
        assert!(err.to_string().contains("BLUR_SIZE"));
    }

    #[test]
    fn env_producing_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.json")).unwrap();

        let result = manager.apply_env_with(lookup_from(&[("BLUR_SIZE", "8")]));
        assert!(result.is_err());
        assert_eq!(manager.get().detection.blur_size, 21);
    }
}
