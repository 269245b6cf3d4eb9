//! 입력 프레임.

use chrono::{DateTime, Utc};
use image::RgbImage;

use camwatch_core::error::CoreError;

use crate::encoder;

/// 카메라 프레임 (RGB 8비트 3채널 + 도착 시각)
///
/// 파이프라인 호출 동안만 소유되며, 이후에는 흑백/블러 참조 프레임만 남는다.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    received_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage, received_at: DateTime<Utc>) -> Self {
        Self { image, received_at }
    }

    /// 인코딩된 이미지 버퍼(JPEG 등)에서 프레임 생성
    pub fn decode(bytes: &[u8], received_at: DateTime<Utc>) -> Result<Self, CoreError> {
        Ok(Self::new(encoder::decode_rgb(bytes)?, received_at))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
