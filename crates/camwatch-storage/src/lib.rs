//! # camwatch-storage
//!
//! 로컬 저장소 어댑터.
//! 분류된 모션 이벤트의 스냅샷(주석 프레임 + 차분 합성 JPEG)을 파일로 저장한다.

pub mod snapshot_storage;
