//! 프레임 차분기.
//!
//! 흑백 변환 → 가우시안 블러 → 직전 프레임과 절대 차이 → 이진화 → 팽창(2회).
//! 참조 프레임은 항상 "직전" 프레임이며, 오래된 기준 프레임을 유지하지 않는다.

use image::{imageops, GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use tracing::{debug, info};

use camwatch_core::error::CoreError;

/// 같은 물체의 조각난 블롭을 합치기 위한 팽창 반복 횟수 (3x3 커널 기준)
pub const DILATE_ITERATIONS: u8 = 2;

/// 이진 마스크의 "켜짐" 값
pub const MASK_ON: u8 = 255;

/// 한 번의 차분 결과
#[derive(Debug, Clone)]
pub struct FrameDiff {
    /// 변화 픽셀 비율 (0.0 ~ 100.0, 팽창된 마스크 기준)
    pub change_percentage: f64,
    /// 블러된 두 프레임의 픽셀별 절대 차이 (재이진화용 원본)
    pub delta: GrayImage,
    /// 임계값 이진화 + 팽창된 마스크 (0 / 255)
    pub mask: GrayImage,
    /// 참조 프레임이 없어 비교 없이 참조만 설정된 경우
    pub is_first_frame: bool,
}

impl FrameDiff {
    /// 첫 프레임 결과: 비율 0, 빈 마스크
    pub fn first_frame() -> Self {
        Self {
            change_percentage: 0.0,
            delta: GrayImage::new(0, 0),
            mask: GrayImage::new(0, 0),
            is_first_frame: true,
        }
    }
}

/// 커널 크기 → 시그마 (`0.3 * ((k - 1) * 0.5 - 1) + 0.8`)
pub fn kernel_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// 흑백 변환 (블러 없음)
pub fn to_gray(frame: &RgbImage) -> GrayImage {
    imageops::grayscale(frame)
}

/// 임계값 초과 픽셀을 255, 나머지를 0으로
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let raw = image
        .as_raw()
        .iter()
        .map(|&p| if p > threshold { MASK_ON } else { 0 })
        .collect();
    // 입력과 같은 크기의 버퍼이므로 항상 성공
    GrayImage::from_raw(image.width(), image.height(), raw)
        .unwrap_or_else(|| GrayImage::new(image.width(), image.height()))
}

/// 0이 아닌 픽셀 수
pub fn count_nonzero(image: &GrayImage) -> u64 {
    image.as_raw().iter().filter(|&&p| p != 0).count() as u64
}

/// 프레임 차분기: 스트림당 하나, 참조 프레임을 독점 소유
#[derive(Debug)]
pub struct FrameDifferencer {
    blur_size: u32,
    sigma: f32,
    diff_threshold: u8,
    reference: Option<GrayImage>,
}

impl FrameDifferencer {
    /// 새 차분기 생성. 커널 크기는 양의 홀수여야 한다.
    pub fn new(blur_size: u32, diff_threshold: u8) -> Result<Self, CoreError> {
        if blur_size == 0 || blur_size % 2 == 0 {
            return Err(CoreError::Config(format!(
                "블러 커널 크기는 양의 홀수여야 함: {blur_size}"
            )));
        }
        info!("FrameDifferencer(blur={blur_size}, threshold={diff_threshold})");
        Ok(Self {
            blur_size,
            sigma: kernel_sigma(blur_size),
            diff_threshold,
            reference: None,
        })
    }

    pub fn blur_size(&self) -> u32 {
        self.blur_size
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// 참조 프레임 제거: 다음 프레임은 첫 프레임으로 취급
    pub fn reset(&mut self) {
        self.reference = None;
    }

    /// 흑백 + 블러
    fn prepare(&self, frame: &RgbImage) -> GrayImage {
        gaussian_blur_f32(&to_gray(frame), self.sigma)
    }

    /// 현재 프레임을 직전 프레임과 비교
    ///
    /// 크기 불일치는 `CoreError::Decode`로 보고하며 참조 프레임을 갱신하지 않는다.
    pub fn diff(&mut self, frame: &RgbImage) -> Result<FrameDiff, CoreError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(CoreError::Decode("크기가 0인 프레임".to_string()));
        }

        let blurred = self.prepare(frame);

        let Some(reference) = self.reference.as_ref() else {
            info!("첫 프레임: 참조 프레임 설정 ({width}x{height})");
            self.reference = Some(blurred);
            return Ok(FrameDiff::first_frame());
        };

        if reference.dimensions() != blurred.dimensions() {
            return Err(CoreError::Decode(format!(
                "프레임 크기 불일치: 참조 {:?}, 현재 {:?}",
                reference.dimensions(),
                blurred.dimensions()
            )));
        }

        let delta_raw: Vec<u8> = blurred
            .as_raw()
            .iter()
            .zip(reference.as_raw())
            .map(|(&curr, &prev)| curr.abs_diff(prev))
            .collect();
        let delta = GrayImage::from_raw(width, height, delta_raw)
            .ok_or_else(|| CoreError::Internal("차분 버퍼 크기 불일치".to_string()))?;

        let raw_mask = binarize(&delta, self.diff_threshold);
        let mask = dilate(&raw_mask, Norm::LInf, DILATE_ITERATIONS);

        let total_pixels = width as u64 * height as u64;
        let changed_pixels = count_nonzero(&mask);
        let change_percentage = changed_pixels as f64 * 100.0 / total_pixels as f64;

        self.reference = Some(blurred);

        debug!(
            "프레임 차분: {changed_pixels}/{total_pixels} 픽셀 변경 ({:.2}%)",
            change_percentage
        );

        Ok(FrameDiff {
            change_percentage,
            delta,
            mask,
            is_first_frame: false,
        })
    }
}
