//! Sample selection and image preprocessing.

mod pair_sampler;
mod search_crop;

pub use pair_sampler::*;
pub use search_crop::*;
