//! 변화 영역 시각화: 스냅샷용 주석 프레임, 차분 이미지, 합성.

use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use camwatch_core::models::motion::{ChangeType, Region};

/// 차분 시각화의 영역 박스 색
pub const REGION_BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const BOX_THICKNESS: u32 = 2;
const CHIP_OFFSET: i32 = 8;
const CHIP_SIZE: u32 = 16;

/// 변화 원인별 표시 색
pub fn change_type_color(change_type: ChangeType) -> Rgb<u8> {
    match change_type {
        ChangeType::Person => Rgb([255, 0, 0]),
        ChangeType::Light => Rgb([255, 255, 0]),
        ChangeType::Object => Rgb([255, 165, 0]),
        ChangeType::Camera => Rgb([255, 0, 255]),
        ChangeType::Unknown => Rgb([128, 128, 128]),
    }
}

/// 안쪽으로 `thickness` 픽셀 두께의 사각형 테두리
fn draw_box(canvas: &mut RgbImage, region: &Region, color: Rgb<u8>, thickness: u32) {
    for i in 0..thickness {
        let inset = 2 * i;
        if region.width <= inset || region.height <= inset {
            break;
        }
        let rect = Rect::at((region.x + i) as i32, (region.y + i) as i32)
            .of_size(region.width - inset, region.height - inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// 절대 차이 이미지 + 녹색 영역 박스
pub fn diff_visualization(delta: &GrayImage, regions: &[Region]) -> RgbImage {
    let mut canvas = RgbImage::from_fn(delta.width(), delta.height(), |x, y| {
        let v = delta.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });
    for region in regions {
        draw_box(&mut canvas, region, REGION_BOX_COLOR, BOX_THICKNESS);
    }
    canvas
}

/// 현재 프레임 + 변화 원인 색의 영역 박스 + 좌상단 색상 칩
pub fn annotate_frame(frame: &RgbImage, regions: &[Region], change_type: ChangeType) -> RgbImage {
    let color = change_type_color(change_type);
    let mut canvas = frame.clone();
    for region in regions {
        draw_box(&mut canvas, region, color, BOX_THICKNESS);
    }
    draw_filled_rect_mut(
        &mut canvas,
        Rect::at(CHIP_OFFSET, CHIP_OFFSET).of_size(CHIP_SIZE, CHIP_SIZE),
        color,
    );
    canvas
}

/// 좌우 합성 (높이는 큰 쪽, 빈 곳은 검정)
pub fn side_by_side(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, left, 0, 0);
    imageops::replace(&mut canvas, right, left.width() as i64, 0);
    canvas
}

/// 스냅샷 합성 이미지: [주석 프레임 | 차분 시각화]
pub fn render_snapshot(
    frame: &RgbImage,
    delta: &GrayImage,
    regions: &[Region],
    change_type: ChangeType,
) -> RgbImage {
    side_by_side(
        &annotate_frame(frame, regions, change_type),
        &diff_visualization(delta, regions),
    )
}
