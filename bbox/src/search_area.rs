//! Search region geometry.

use super::{Rect, Size, XYXY};
use crate::common::*;

/// The default ratio of search radius to the target box diagonal.
pub const DEFAULT_SEARCH_RATE: f64 = 0.8;

/// Integer pixel rectangle clipped to the image bounds.
///
/// It satisfies `0 <= x0 <= x1 <= width` and `0 <= y0 <= y1 <= height` for
/// the image it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchArea {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl SearchArea {
    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }

    /// Returns true if the area has zero width or height.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn to_xyxy(&self) -> XYXY<f64> {
        XYXY {
            x_min: self.x0 as f64,
            y_min: self.y0 as f64,
            x_max: self.x1 as f64,
            y_max: self.y1 as f64,
        }
    }
}

/// Compute the region around `bbox` where the target is searched in the next frame.
///
/// The region is a square of radius `diagonal * search_rate` centered at
/// the box. A region that overflows an image edge is shifted back inside
/// without resizing, independently per axis. A region still larger than the
/// image is clipped to the image bounds afterwards.
pub fn try_calc_search_area(
    bbox: &XYXY<f64>,
    image_size: &Size<u32>,
    search_rate: f64,
) -> Result<SearchArea> {
    ensure!(
        search_rate.is_finite() && search_rate > 0.0,
        "search_rate must be a positive number, but get {}",
        search_rate
    );
    let [cx, cy, w, h] = [bbox.cx(), bbox.cy(), bbox.w(), bbox.h()];
    ensure!(
        cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite(),
        "bounding box coordinates must be finite, but get {:?}",
        bbox
    );

    let radius = (w.powi(2) + h.powi(2)).sqrt() * search_rate;
    let (x0, x1) = shift_into_bounds(cx - radius, cx + radius, image_size.w());
    let (y0, y1) = shift_into_bounds(cy - radius, cy + radius, image_size.h());

    Ok(SearchArea { x0, y0, x1, y1 })
}

pub fn calc_search_area(bbox: &XYXY<f64>, image_size: &Size<u32>, search_rate: f64) -> SearchArea {
    try_calc_search_area(bbox, image_size, search_rate).unwrap()
}

/// Shift `[lo, hi]` by the minimal offset that brings it into `[0, limit]`,
/// truncate to integers, then clip what still overflows.
fn shift_into_bounds(lo: f64, hi: f64, limit: u32) -> (i64, i64) {
    let limit_f = limit as f64;
    let (lo, hi) = if lo < 0.0 {
        (0.0, hi - lo)
    } else if hi > limit_f {
        (lo - (hi - limit_f), limit_f)
    } else {
        (lo, hi)
    };

    let lo = lo as i64;
    let hi = hi as i64;
    (lo.max(0), hi.min(limit as i64))
}
