//! JPEG 인코딩/디코딩.
//!
//! 외부 비전 API 전송과 스냅샷 저장에 쓰는 JPEG 바이트를 만든다.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

use camwatch_core::error::CoreError;

/// 외부 API 전송용 JPEG 품질
pub const API_JPEG_QUALITY: u8 = 80;

/// 스냅샷 저장용 JPEG 품질
pub const SNAPSHOT_JPEG_QUALITY: u8 = 90;

/// RGB 이미지 → JPEG 바이트
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        encoder
            .encode_image(image)
            .map_err(|e| CoreError::Internal(format!("JPEG 인코딩 실패: {e}")))?;
    }

    debug!(
        "JPEG 인코딩: {}x{} → {} bytes (품질 {})",
        image.width(),
        image.height(),
        buffer.len(),
        quality
    );
    Ok(buffer)
}

/// 인코딩된 이미지 버퍼 → RGB 이미지
///
/// 포맷은 매직 바이트로 추정한다. 실패 시 `CoreError::Decode`.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Decode("빈 프레임 버퍼".to_string()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| CoreError::Decode(format!("이미지 디코딩 실패 ({} bytes): {e}", bytes.len())))?;
    let rgb = image.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(CoreError::Decode("크기가 0인 프레임".to_string()));
    }
    Ok(rgb)
}
