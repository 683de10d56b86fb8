//! Safe bounding box types, search area geometry and the box codec.

mod common;

pub use transform::*;
mod transform;

pub use rect::*;
pub mod rect;

pub use xyxy::*;
pub mod xyxy;

pub use cxcywh::*;
pub mod cxcywh;

pub use size::*;
pub mod size;

pub use search_area::*;
pub mod search_area;

pub use codec::*;
pub mod codec;

pub mod prelude {
    pub use crate::rect::{Rect, RectNum};
}
