//! Search region cropping and input normalization.

use crate::{common::*, dataset::Sample};
use bbox::{try_calc_search_area, try_encode, DEFAULT_SEARCH_RATE};

/// The default height and width of network inputs.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// The frame whose box is encoded as the regression target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFrame {
    Reference,
    Search,
}

impl Default for TargetFrame {
    fn default() -> Self {
        Self::Reference
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCropInit {
    pub input_size: Size<u32>,
    pub search_rate: R64,
    pub target_frame: TargetFrame,
}

impl SearchCropInit {
    pub fn build(self) -> Result<SearchCrop> {
        let Self {
            input_size,
            search_rate,
            target_frame,
        } = self;

        ensure!(
            input_size.w() > 0 && input_size.h() > 0,
            "input size must be positive, but get {:?}",
            input_size
        );
        ensure!(
            search_rate > 0.0 && search_rate.raw().is_finite(),
            "search_rate must be a positive finite number, but get {}",
            search_rate
        );

        Ok(SearchCrop {
            input_size,
            search_rate: search_rate.raw(),
            target_frame,
        })
    }
}

impl Default for SearchCropInit {
    fn default() -> Self {
        Self {
            input_size: Size::from_wh([DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE]),
            search_rate: r64(DEFAULT_SEARCH_RATE),
            target_frame: TargetFrame::default(),
        }
    }
}

/// Network inputs and target of one training pair.
#[derive(Debug, Clone)]
pub struct TrainInput {
    /// `(H, W, 3)` normalized reference crop.
    pub reference: Array3<f32>,
    /// `(H, W, 3)` normalized search crop.
    pub search: Array3<f32>,
    pub target: EncodedBox,
    pub search_area: SearchArea,
}

/// Single-sample network inputs with a leading batch axis of size 1.
#[derive(Debug, Clone)]
pub struct PredictInput {
    pub reference: Array4<f32>,
    pub search: Array4<f32>,
}

/// Crops a frame pair around the reference box and normalizes the crops.
///
/// The search area is computed once from the reference box and the
/// reference image, then applied to both frames.
#[derive(Debug, Clone)]
pub struct SearchCrop {
    input_size: Size<u32>,
    search_rate: f64,
    target_frame: TargetFrame,
}

impl SearchCrop {
    pub fn input_size(&self) -> Size<u32> {
        self.input_size
    }

    pub fn search_area(&self, bbox: &XYXY<f64>, image: &RgbImage) -> Result<SearchArea> {
        let image_size = Size::from_wh([image.width(), image.height()]);
        try_calc_search_area(bbox, &image_size, self.search_rate)
    }

    pub fn make_train_input(&self, sample: &Sample) -> Result<TrainInput> {
        let Sample { reference, search } = sample;

        let reference_image = load_rgb_image(&reference.image_path)?;
        let search_area = self.search_area(&reference.bbox, &reference_image)?;
        let target_bbox = match self.target_frame {
            TargetFrame::Reference => &reference.bbox,
            TargetFrame::Search => &search.bbox,
        };
        let target = try_encode(target_bbox, &search_area).with_context(|| {
            format!(
                "cannot encode the target of pair ('{}', '{}')",
                reference.image_path.display(),
                search.image_path.display()
            )
        })?;

        let search_image = load_rgb_image(&search.image_path)?;
        let reference_crop = self.crop(&reference_image, &search_area)?;
        let search_crop = self
            .crop(&search_image, &search_area)
            .with_context(|| format!("failed to crop '{}'", search.image_path.display()))?;

        Ok(TrainInput {
            reference: reference_crop,
            search: search_crop,
            target,
            search_area,
        })
    }

    pub fn make_predict_input(
        &self,
        reference_image: &RgbImage,
        reference_bbox: &XYXY<f64>,
        search_image: &RgbImage,
    ) -> Result<(PredictInput, SearchArea)> {
        let search_area = self.search_area(reference_bbox, reference_image)?;
        let reference = self
            .crop(reference_image, &search_area)?
            .insert_axis(Axis(0));
        let search = self.crop(search_image, &search_area)?.insert_axis(Axis(0));
        Ok((PredictInput { reference, search }, search_area))
    }

    /// Crop the search area, resize it to the input size and map pixel values to `[-1, 1]`.
    pub fn crop(&self, image: &RgbImage, search_area: &SearchArea) -> Result<Array3<f32>> {
        let (width, height) = image.dimensions();
        let SearchArea { x0, y0, x1, y1 } = *search_area;
        ensure!(
            !search_area.is_empty(),
            "cannot crop the empty search area {:?}",
            search_area
        );
        ensure!(
            x0 >= 0 && y0 >= 0 && x1 <= width as i64 && y1 <= height as i64,
            "search area {:?} exceeds the image extent {}x{}",
            search_area,
            width,
            height
        );

        let cropped = imageops::crop_imm(
            image,
            x0 as u32,
            y0 as u32,
            search_area.width() as u32,
            search_area.height() as u32,
        )
        .to_image();
        let resized = imageops::resize(
            &cropped,
            self.input_size.w(),
            self.input_size.h(),
            FilterType::CatmullRom,
        );

        let (out_w, out_h) = resized.dimensions();
        let values: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(normalize_pixel)
            .collect();
        let array = Array3::from_shape_vec((out_h as usize, out_w as usize, 3), values)?;
        Ok(array)
    }
}

fn normalize_pixel(value: u8) -> f32 {
    value as f32 / 128.0 - 1.0
}

/// Decode an image file into 8-bit RGB.
pub fn load_rgb_image(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let image = image::io::Reader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| {
            format!(
                "failed to determine the image file format: {}",
                path.display()
            )
        })?
        .decode()
        .with_context(|| format!("failed to decode image file: {}", path.display()))?
        .to_rgb8();
    Ok(image)
}
