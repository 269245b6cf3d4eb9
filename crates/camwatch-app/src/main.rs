//! # camwatch-app
//!
//! camwatch 모션 분석기 바이너리 진입점.
//! 설정 로드, 파이프라인 조립, 허브 스트림 루프와 종료 처리.

mod lifecycle;
mod stream;
mod wiring;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use camwatch_core::config::AppConfig;
use camwatch_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use camwatch_network::hub_client::HubClient;

use crate::lifecycle::LifecycleManager;
use crate::stream::StreamEnd;

/// camwatch 모션 분석기
///
/// 카메라 허브의 프레임 스트림에서 움직임을 감지하고 원인을 분류한다.
#[derive(Parser, Debug)]
#[command(name = "camwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 허브 WebSocket URL (기본: ws://localhost:8887)
    #[arg(long, short = 's')]
    hub: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 스냅샷 저장 경로
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// 외부 비전 분류 비활성화 (로컬 휴리스틱만 사용)
    #[arg(long)]
    no_ai: bool,
}

/// 설정 파일 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/io.granule.camwatch/config.json`
/// - Windows: `%APPDATA%\granule\camwatch\config\config.json`
/// - Linux: `~/.config/camwatch/config.json`
fn resolve_config_path(cli: Option<PathBuf>) -> PathBuf {
    cli.or_else(|| {
        ProjectDirs::from("io", "granule", "camwatch")
            .map(|p| p.config_dir().join(CONFIG_FILE_NAME))
    })
    .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// CLI 인자를 설정 위에 덮어쓴다 (환경변수보다 우선)
fn apply_cli_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(hub) = &args.hub {
        config.hub.url = hub.clone();
    }
    if let Some(dir) = &args.snapshot_dir {
        config.snapshot.dir = dir.clone();
    }
    if args.no_ai {
        config.detection.enable_ai_analysis = false;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = [
        "camwatch",
        "camwatch_app",
        "camwatch_core",
        "camwatch_vision",
        "camwatch_network",
        "camwatch_storage",
    ]
    .iter()
    .map(|target| format!("{target}={}", args.log_level))
    .collect::<Vec<_>>()
    .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("camwatch v{} 시작", env!("CARGO_PKG_VERSION"));

    let config_manager = ConfigManager::with_path(resolve_config_path(args.config.clone()))
        .context("설정 관리자 초기화 실패")?;
    info!("설정 파일: {}", config_manager.config_path().display());

    let mut config = config_manager
        .apply_process_env()
        .context("환경변수 설정 적용 실패")?;
    apply_cli_overrides(&mut config, &args);
    config.validate().context("설정 검증 실패")?;

    let mut pipeline = wiring::build_pipeline(&config)
        .await
        .context("파이프라인 생성 실패")?;
    let stats = pipeline.stats();
    info!(
        "파이프라인 준비: blur={} 외부분류={} 쿨다운={}초",
        stats.blur_size, stats.ai_enabled, stats.cooldown_secs
    );

    let lifecycle = Arc::new(LifecycleManager::new());
    let mut shutdown_rx = lifecycle.subscribe();
    {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move { lifecycle.wait_for_signal().await });
    }

    let client = HubClient::new(config.hub.analyzer_url(), env!("CARGO_PKG_VERSION"));
    let (sender, mut inbound) = client
        .connect()
        .await
        .with_context(|| format!("허브 연결 실패: {}", client.url()))?;

    let end = stream::run_stream(&mut pipeline, &sender, &mut inbound, &mut shutdown_rx).await;
    match end {
        StreamEnd::Shutdown => {
            info!("종료 요청: 허브 연결 닫는 중");
            if let Err(e) = sender.close().await {
                warn!("허브 연결 종료 실패: {e}");
            }
        }
        StreamEnd::HubClosed => warn!("허브가 연결을 닫음"),
    }

    let stats = pipeline.stats();
    info!(
        "camwatch 종료: 처리 프레임 {}개, 마지막 분류 {:?}",
        stats.frame_count, stats.last_classification
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/cw.json")));
        assert_eq!(path, PathBuf::from("/tmp/cw.json"));
    }

    #[test]
    fn default_config_path_is_config_json() {
        let path = resolve_config_path(None);
        assert_eq!(path.file_name().unwrap(), CONFIG_FILE_NAME);
    }

    #[test]
    fn cli_overrides_apply() {
        let args = Args::parse_from([
            "camwatch",
            "-s",
            "ws://hub:9000",
            "--snapshot-dir",
            "/tmp/snaps",
            "--no-ai",
        ]);
        let mut config = AppConfig::default_config();
        apply_cli_overrides(&mut config, &args);

        assert_eq!(config.hub.analyzer_url(), "ws://hub:9000/analyzer");
        assert_eq!(config.snapshot.dir, PathBuf::from("/tmp/snaps"));
        assert!(!config.detection.enable_ai_analysis);
        assert_eq!(args.log_level, "info");
    }
}
