//! 변화 마스크 → 변화 영역 추출.
//!
//! 8-연결 성분 라벨링으로 마스크의 덩어리를 찾고 각 덩어리의 바운딩 박스와
//! 실제 변화 픽셀 수를 계산한다. 최소 면적 필터는 그리기/분류용이며,
//! 전체 커버리지 통계는 항상 필터 전 마스크에서 계산해야 한다.

use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use camwatch_core::models::motion::Region;

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixels: u32,
}

impl Bounds {
    fn at(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixels: 0,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixels += 1;
    }

    fn into_region(self) -> Region {
        Region {
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
            area: self.pixels,
        }
    }
}

/// 마스크의 모든 변화 영역 (면적 필터 없음), 면적 내림차순
pub fn all_regions(mask: &GrayImage) -> Vec<Region> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let mut bounds: BTreeMap<u32, Bounds> = BTreeMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0];
        if label == 0 {
            continue;
        }
        bounds
            .entry(label)
            .or_insert_with(|| Bounds::at(x, y))
            .include(x, y);
    }

    let mut regions: Vec<Region> = bounds.into_values().map(Bounds::into_region).collect();
    regions.sort_by(|a, b| {
        b.area
            .cmp(&a.area)
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });
    regions
}

/// `min_area` 미만 영역을 제외한 변화 영역, 면적 내림차순
pub fn extract_regions(mask: &GrayImage, min_area: u32) -> Vec<Region> {
    all_regions(mask)
        .into_iter()
        .filter(|r| r.area >= min_area)
        .collect()
}

/// 가장 큰 영역 (실제 변화 픽셀 수 기준)
pub fn largest(regions: &[Region]) -> Option<&Region> {
    regions.iter().max_by_key(|r| r.area)
}
