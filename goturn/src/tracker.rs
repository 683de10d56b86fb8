//! Frame-by-frame tracking over a loaded sequence.

use crate::{
    common::*,
    dataset::FrameBox,
    processor::{load_rgb_image, SearchCrop, SearchCropInit},
};
use bbox::try_decode;

/// A regression model mapping a reference/search crop pair to an encoded box.
pub trait TrackerModel {
    /// Predict `(N, 4)` encoded boxes from `(N, H, W, 3)` reference and search crops.
    fn predict(&self, reference: ArrayView4<f32>, search: ArrayView4<f32>) -> Result<Array2<f32>>;
}

impl<M> TrackerModel for &M
where
    M: TrackerModel + ?Sized,
{
    fn predict(&self, reference: ArrayView4<f32>, search: ArrayView4<f32>) -> Result<Array2<f32>> {
        (**self).predict(reference, search)
    }
}

/// The box used to crop the reference frame at every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSource {
    /// The annotated box of the previous frame.
    GroundTruth,
    /// The predicted box of the previous frame.
    Prediction,
}

impl Default for ReferenceSource {
    fn default() -> Self {
        Self::GroundTruth
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackerInit {
    pub search_crop: SearchCropInit,
    pub reference_source: ReferenceSource,
}

impl TrackerInit {
    pub fn build<M>(self, model: M) -> Result<Tracker<M>>
    where
        M: TrackerModel,
    {
        let Self {
            search_crop,
            reference_source,
        } = self;

        Ok(Tracker {
            model,
            search_crop: search_crop.build()?,
            reference_source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Tracker<M>
where
    M: TrackerModel,
{
    model: M,
    search_crop: SearchCrop,
    reference_source: ReferenceSource,
}

impl<M> Tracker<M>
where
    M: TrackerModel,
{
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Predict the box in `search_image` from the reference frame and its box.
    pub fn predict_next(
        &self,
        reference_image: &RgbImage,
        reference_bbox: &XYXY<f64>,
        search_image: &RgbImage,
    ) -> Result<XYXY<f64>> {
        let (input, search_area) =
            self.search_crop
                .make_predict_input(reference_image, reference_bbox, search_image)?;
        let output = self
            .model
            .predict(input.reference.view(), input.search.view())?;

        ensure!(
            output.ncols() == 4,
            "model output must have 4 columns, but get shape {:?}",
            output.shape()
        );
        ensure!(output.nrows() > 0, "model output is empty");

        let row = output.row(0);
        let encoded = EncodedBox::from_array([row[0], row[1], row[2], row[3]]);
        try_decode(&encoded, &search_area)
    }

    /// Track through `frames`, returning one box per frame.
    ///
    /// The first box is the annotation of the first frame.
    pub fn track(&self, frames: &[FrameBox]) -> Result<Vec<XYXY<f64>>> {
        let (first, rest) = match frames.split_first() {
            Some(split) => split,
            None => return Ok(vec![]),
        };

        let mut boxes = Vec::with_capacity(frames.len());
        boxes.push(first.bbox.clone());
        let mut reference_image = load_rgb_image(&first.image_path)?;

        for (index, (prev, frame)) in frames.iter().zip(rest).enumerate() {
            let reference_bbox = match self.reference_source {
                ReferenceSource::GroundTruth => &prev.bbox,
                ReferenceSource::Prediction => &boxes[index],
            };
            let search_image = load_rgb_image(&frame.image_path)?;
            let bbox = self
                .predict_next(&reference_image, reference_bbox, &search_image)
                .with_context(|| {
                    format!("failed to track frame '{}'", frame.image_path.display())
                })?;

            boxes.push(bbox);
            reference_image = search_image;
        }

        Ok(boxes)
    }
}
