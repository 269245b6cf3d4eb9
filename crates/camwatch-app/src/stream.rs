//! 허브 스트림 처리 루프.
//!
//! 프레임은 도착 순서대로 한 번에 하나씩 처리된다. 분류 호출 중 도착한 프레임은
//! 수신 채널에 쌓이며, 종료 신호는 처리 중인 프레임이 끝난 뒤에 반영된다.

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use camwatch_core::models::hub::{HubCommand, HubMessage};
use camwatch_core::models::motion::{ChangeType, MotionEvent};
use camwatch_network::hub_client::{HubFrame, HubSender};
use camwatch_vision::pipeline::MotionPipeline;

/// 루프 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// 종료 신호 수신
    Shutdown,
    /// 허브가 연결을 닫음
    HubClosed,
}

/// 종료 신호 또는 연결 종료까지 허브 메시지 처리
pub async fn run_stream(
    pipeline: &mut MotionPipeline,
    sender: &HubSender,
    inbound: &mut mpsc::Receiver<HubFrame>,
    shutdown: &mut watch::Receiver<bool>,
) -> StreamEnd {
    loop {
        if *shutdown.borrow() {
            return StreamEnd::Shutdown;
        }

        let frame = tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return StreamEnd::Shutdown;
                }
                continue;
            }
            frame = inbound.recv() => frame,
        };

        match frame {
            Some(HubFrame::Binary(bytes)) => handle_frame(pipeline, sender, &bytes).await,
            Some(HubFrame::Text(text)) => handle_text(sender, &text).await,
            Some(HubFrame::Close) | None => {
                info!("허브 연결 종료");
                return StreamEnd::HubClosed;
            }
        }
    }
}

/// 프레임 하나 처리: 디버그 레코드는 항상, 이벤트는 분류된 경우에만 전송
async fn handle_frame(pipeline: &mut MotionPipeline, sender: &HubSender, bytes: &[u8]) {
    let processed = pipeline.process_encoded(bytes, Utc::now()).await;

    match HubMessage::motion_debug(&processed.debug_record()) {
        Ok(message) => send_or_warn(sender, &message).await,
        Err(e) => warn!("디버그 레코드 직렬화 실패: {e}"),
    }

    let event = &processed.event;
    if !event.is_classified() {
        return;
    }

    info!("{}", event_summary(event));
    match HubMessage::motion_event(event) {
        Ok(message) => send_or_warn(sender, &message).await,
        Err(e) => warn!("모션 이벤트 직렬화 실패: {e}"),
    }
}

/// 로그용 이벤트 요약 (한국어 라벨)
fn event_summary(event: &MotionEvent) -> String {
    format!(
        "모션 이벤트 #{}: {} {:.2}% → {} ({:.2})",
        event.frame_number,
        event.motion_level.label(),
        event.change_percentage,
        event
            .change_type
            .map(|t| t.label())
            .unwrap_or(ChangeType::Unknown.label()),
        event.confidence
    )
}

async fn handle_text(sender: &HubSender, text: &str) {
    match HubCommand::parse(text) {
        Ok(HubCommand::Ping) => send_or_warn(sender, &HubMessage::pong()).await,
        Ok(HubCommand::Config(config)) => info!("허브 설정 갱신 수신: {config}"),
        Ok(HubCommand::Other(kind)) => debug!("텍스트 메시지: {kind}"),
        Err(e) => warn!("잘못된 JSON 메시지: {e}"),
    }
}

async fn send_or_warn(sender: &HubSender, message: &HubMessage) {
    if let Err(e) = sender.send(message).await {
        warn!("{} 전송 실패: {e}", message.message_type);
    }
}
