//! # camwatch-vision
//!
//! 프레임 차분 기반 모션 감지 크레이트.
//! 연속된 두 프레임을 비교해 변화 비율과 모션 레벨을 계산하고,
//! 변화 원인(사람/물체/조명/카메라)을 휴리스틱 또는 외부 비전 분류기로 추정한다.
//!
//! 처리 순서: [`differencer`] → [`motion_level`] / [`regions`] →
//! [`analyzer`] (쿨다운 + [`classifier`]/[`heuristic`]) → [`pipeline`] 이벤트 생성.

pub mod analyzer;
pub mod annotate;
pub mod classifier;
pub mod differencer;
pub mod encoder;
pub mod frame;
pub mod heuristic;
pub mod motion_level;
pub mod pipeline;
pub mod regions;
