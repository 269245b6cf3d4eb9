//! camwatch 도메인 모델.
//!
//! 카메라 허브와 주고받는 메시지 및 모션 분석 결과 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod hub;
pub mod motion;
