//! Training data pipeline configuration format.

use crate::{
    common::*,
    dataset::{DEFAULT_IMAGE_EXTENSION, GROUNDTRUTH_FILE},
    processor::{TargetFrame, DEFAULT_DIFF_LIST, DEFAULT_INPUT_SIZE},
};
use bbox::DEFAULT_SEARCH_RATE;

pub use dataset::*;
pub use preprocessor::*;
pub use sampler::*;
pub use training::*;

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub preprocessor: PreprocessorConfig,
    pub training: TrainingConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config = json5::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        Ok(config)
    }
}

mod dataset {
    use super::*;

    /// Dataset options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// The directory holding one subdirectory per sequence.
        pub dataset_dir: PathBuf,
        /// Optional list of training sequences, relative to `dataset_dir`.
        pub train_list: Option<PathBuf>,
        /// Optional list of validation sequences, relative to `dataset_dir`.
        pub valid_list: Option<PathBuf>,
        #[serde(default = "default_image_extension")]
        pub image_extension: String,
        #[serde(default = "default_groundtruth_file")]
        pub groundtruth_file: String,
    }

    fn default_image_extension() -> String {
        DEFAULT_IMAGE_EXTENSION.to_owned()
    }

    fn default_groundtruth_file() -> String {
        GROUNDTRUTH_FILE.to_owned()
    }
}

mod sampler {
    use super::*;

    /// Frame pair sampling options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SamplerConfig {
        /// Offsets from the reference frame index to the search frame index.
        #[serde(default = "default_diff_list")]
        pub diff_list: Vec<isize>,
        /// If set, keep at most this many pairs per offset and sequence.
        pub sample_per_diff: Option<NonZeroUsize>,
    }

    impl Default for SamplerConfig {
        fn default() -> Self {
            Self {
                diff_list: default_diff_list(),
                sample_per_diff: None,
            }
        }
    }

    fn default_diff_list() -> Vec<isize> {
        DEFAULT_DIFF_LIST.to_vec()
    }
}

mod preprocessor {
    use super::*;

    /// Data preprocessing options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PreprocessorConfig {
        /// The network input size.
        #[serde(default)]
        pub input_size: InputSize,
        /// The search area radius in units of the box diagonal.
        #[serde(default = "default_search_rate")]
        pub search_rate: R64,
        /// The frame whose box becomes the regression target.
        #[serde(default)]
        pub target_frame: TargetFrame,
    }

    impl Default for PreprocessorConfig {
        fn default() -> Self {
            Self {
                input_size: InputSize::default(),
                search_rate: default_search_rate(),
                target_frame: TargetFrame::default(),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InputSize {
        pub h: NonZeroUsize,
        pub w: NonZeroUsize,
    }

    impl InputSize {
        pub fn to_size(&self) -> Size<u32> {
            Size::from_wh([self.w.get() as u32, self.h.get() as u32])
        }
    }

    impl Default for InputSize {
        fn default() -> Self {
            let side = NonZeroUsize::new(DEFAULT_INPUT_SIZE as usize).unwrap();
            Self { h: side, w: side }
        }
    }

    fn default_search_rate() -> R64 {
        r64(DEFAULT_SEARCH_RATE)
    }
}

mod training {
    use super::*;

    /// The training loop options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TrainingConfig {
        /// The batch size.
        pub batch_size: NonZeroUsize,
        /// The number of epochs to iterate.
        pub epochs: usize,
        /// The number of concurrent batch loading workers. Defaults to the number of CPUs.
        pub num_workers: Option<NonZeroUsize>,
        /// If set, seed the sampling RNG for reproducible epochs.
        pub seed: Option<u64>,
    }
}
