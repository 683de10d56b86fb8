//! Conversion between pixel boxes and search-area relative regression targets.

use super::{CxCyWH, RectNum, SearchArea, Transform, XYXY};
use crate::common::*;

/// Box center and size expressed as ratios of the search area extent.
///
/// The values are not clipped to `[0, 1]`. A box may extend beyond the
/// search area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl EncodedBox {
    pub fn from_array(array: [f32; 4]) -> Self {
        let [cx, cy, w, h] = array;
        Self {
            cx: cx as f64,
            cy: cy as f64,
            w: w as f64,
            h: h as f64,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.cx as f32, self.cy as f32, self.w as f32, self.h as f32]
    }
}

/// The affine map from pixel coordinates to the unit square of the search area.
fn unit_transform(search_area: &SearchArea) -> Result<Transform<f64>> {
    ensure!(
        !search_area.is_empty(),
        "search area {:?} must have positive width and height",
        search_area
    );
    let unit = XYXY::from_xyxy([0.0, 0.0, 1.0, 1.0]);
    Ok(Transform::from_rects(&search_area.to_xyxy(), &unit))
}

pub fn try_encode(bbox: &XYXY<f64>, search_area: &SearchArea) -> Result<EncodedBox> {
    let transform = unit_transform(search_area)?;
    let CxCyWH { cx, cy, w, h } = &transform * &bbox.to_cxcywh();
    Ok(EncodedBox { cx, cy, w, h })
}

/// Encode a pixel box against a search area.
///
/// # Panics
/// The search area must have non-zero width and height.
pub fn encode(bbox: &XYXY<f64>, search_area: &SearchArea) -> EncodedBox {
    try_encode(bbox, search_area).unwrap()
}

/// Inverse of [try_encode]. Fails on an empty search area.
///
/// Any encoded values are accepted. A negative width or height yields the
/// box spanning the same corners, so the result is always well ordered.
pub fn try_decode(encoded: &EncodedBox, search_area: &SearchArea) -> Result<XYXY<f64>> {
    let transform = unit_transform(search_area)?.inverse();
    let EncodedBox { cx, cy, w, h } = *encoded;
    let (x0, x1) = (cx - w / 2.0, cx + w / 2.0);
    let (y0, y1) = (cy - h / 2.0, cy + h / 2.0);
    let unit = XYXY {
        x_min: x0.min(x1),
        y_min: y0.min(y1),
        x_max: x0.max(x1),
        y_max: y0.max(y1),
    };
    Ok(&transform * &unit)
}

pub fn decode(encoded: &EncodedBox, search_area: &SearchArea) -> XYXY<f64> {
    try_decode(encoded, search_area).unwrap()
}
