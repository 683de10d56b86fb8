//! Dataset loading toolkit.

mod record;
mod split;
mod vot;

pub use record::*;
pub use split::*;
pub use vot::*;
