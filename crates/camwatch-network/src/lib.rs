//! # camwatch-network
//!
//! 네트워크 어댑터.
//! 카메라 허브와의 WebSocket 연결([`hub_client`])과
//! 외부 비전 분류 API 호출([`remote_vision`])을 담당한다.

pub mod hub_client;
pub mod remote_vision;
