use crate::common::*;

/// The image path and the axis-aligned target box of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBox {
    pub image_path: PathBuf,
    /// Bounding box in pixel units.
    pub bbox: XYXY<f64>,
}

/// A reference/search frame pair used as one training sample.
#[derive(Debug, Clone)]
pub struct Sample {
    pub reference: Arc<FrameBox>,
    pub search: Arc<FrameBox>,
}

/// The annotated frames of one sequence directory in playback order.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    pub frames: Vec<Arc<FrameBox>>,
}
