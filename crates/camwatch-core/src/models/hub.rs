//! 카메라 허브 메시지 모델.
//!
//! 허브와 주고받는 JSON 텍스트 메시지 envelope: `{ type, data, timestamp }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::models::motion::{MotionDebug, MotionEvent};

/// 분석기 역할 이름 (`identify` 메시지)
pub const ANALYZER_ROLE: &str = "motion_analyzer";

/// 분석기가 광고하는 기능 목록
pub const ANALYZER_CAPABILITIES: [&str; 2] = ["motion_detection", "ai_analysis"];

/// 허브 송신 메시지
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubMessage {
    /// 메시지 타입 (`identify`, `pong`, `motion_event`, `motion_debug`)
    #[serde(rename = "type")]
    pub message_type: String,
    /// 페이로드
    pub data: Value,
    /// 송신 시각
    pub timestamp: DateTime<Utc>,
}

impl HubMessage {
    fn new(message_type: &str, data: Value) -> Self {
        Self {
            message_type: message_type.to_string(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// 접속 직후 역할 식별 메시지
    pub fn identify(version: &str) -> Self {
        Self::new(
            "identify",
            serde_json::json!({
                "role": ANALYZER_ROLE,
                "version": version,
                "capabilities": ANALYZER_CAPABILITIES,
            }),
        )
    }

    /// `ping` 응답
    pub fn pong() -> Self {
        Self::new("pong", serde_json::json!({}))
    }

    /// 분류까지 완료된 모션 이벤트
    pub fn motion_event(event: &MotionEvent) -> Result<Self, CoreError> {
        Ok(Self::new("motion_event", serde_json::to_value(event)?))
    }

    /// 프레임별 디버그 레코드
    pub fn motion_debug(debug: &MotionDebug) -> Result<Self, CoreError> {
        Ok(Self::new("motion_debug", serde_json::to_value(debug)?))
    }
}

/// 허브 수신 텍스트 명령
#[derive(Debug, Clone, PartialEq)]
pub enum HubCommand {
    /// 생존 확인: `pong`으로 응답
    Ping,
    /// 설정 갱신 통지 (현재는 로그만 남김)
    Config(Value),
    /// 알 수 없는 타입
    Other(String),
}

impl HubCommand {
    /// JSON 텍스트 메시지 파싱
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text)?;
        let message_type = value.get("type").and_then(|t| t.as_str()).unwrap_or("");

        Ok(match message_type {
            "ping" => HubCommand::Ping,
            "config" => HubCommand::Config(value),
            other => HubCommand::Other(other.to_string()),
        })
    }
}
