//! The epoch-aware training batch generator.

use crate::{
    common::*,
    config::Config,
    dataset::{list_sequence_dirs, read_sequence_list, Sample, Sequence, VotLoaderInit},
    processor::{pick_pairs, SearchCrop, SearchCropInit, TrainInput},
};

/// Random-access batch provider driven by a training loop.
///
/// `get_batch` only reads, so it can be called from many workers at once.
/// `on_epoch_end` requires exclusive access, which orders it after every
/// fetch of the finished epoch.
pub trait BatchSource {
    /// The number of batches in the current epoch.
    fn batch_count(&self) -> usize;

    /// Build the batch at `index` of the current epoch.
    fn get_batch(&self, index: usize) -> Result<Batch>;

    /// Prepare the samples of the next epoch.
    fn on_epoch_end(&mut self);

    /// A snapshot of the current epoch that can be shared with loading workers.
    fn epoch_samples(&self) -> EpochSamples;
}

/// Stacked network inputs and targets.
#[derive(Debug, Clone)]
pub struct Batch {
    /// `(N, H, W, 3)` reference crops in `[-1, 1]`.
    pub reference_images: Array4<f32>,
    /// `(N, H, W, 3)` search crops in `[-1, 1]`.
    pub search_images: Array4<f32>,
    /// `(N, 4)` encoded boxes in `(cx, cy, w, h)` order.
    pub targets: Array2<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn from_inputs(inputs: &[TrainInput]) -> Result<Self> {
        let reference_views = inputs.iter().map(|input| input.reference.view()).collect_vec();
        let search_views = inputs.iter().map(|input| input.search.view()).collect_vec();
        let targets = inputs
            .iter()
            .flat_map(|input| input.target.to_array())
            .collect_vec();

        Ok(Self {
            reference_images: ndarray::stack(Axis(0), &reference_views)?,
            search_images: ndarray::stack(Axis(0), &search_views)?,
            targets: Array2::from_shape_vec((inputs.len(), 4), targets)?,
        })
    }
}

/// The immutable sample list of one epoch.
///
/// Cloning is cheap. Batches fetched from a snapshot stay valid after the
/// generator moves on to the next epoch.
#[derive(Debug, Clone)]
pub struct EpochSamples {
    epoch: usize,
    batch_size: usize,
    samples: Arc<[Sample]>,
    search_crop: Arc<SearchCrop>,
}

impl EpochSamples {
    pub fn new(
        epoch: usize,
        batch_size: usize,
        samples: impl Into<Arc<[Sample]>>,
        search_crop: Arc<SearchCrop>,
    ) -> Result<Self> {
        ensure!(batch_size > 0, "batch_size must be positive");
        Ok(Self {
            epoch,
            batch_size,
            samples: samples.into(),
            search_crop,
        })
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn batch_count(&self) -> usize {
        (self.samples.len() + self.batch_size - 1) / self.batch_size
    }

    /// The samples of batch `index`. The last batch may be shorter than the batch size.
    pub fn batch_samples(&self, index: usize) -> Result<&[Sample]> {
        let batch_count = self.batch_count();
        ensure!(
            index < batch_count,
            "batch index {} is out of range, the epoch has {} batches",
            index,
            batch_count
        );

        let start = index * self.batch_size;
        let end = (start + self.batch_size).min(self.samples.len());
        Ok(&self.samples[start..end])
    }

    pub fn get_batch(&self, index: usize) -> Result<Batch> {
        let inputs: Vec<TrainInput> = self
            .batch_samples(index)?
            .iter()
            .map(|sample| self.search_crop.make_train_input(sample))
            .collect::<Result<_>>()
            .with_context(|| {
                format!("failed to build batch {} of epoch {}", index, self.epoch)
            })?;
        Batch::from_inputs(&inputs)
    }
}

/// Options to build a [TrainGenerator].
#[derive(Debug, Clone)]
pub struct TrainGeneratorInit {
    /// The directory holding sequence directories.
    pub dataset_dir: PathBuf,
    /// Optional list file of sequence names, relative to `dataset_dir`.
    pub target_list: Option<PathBuf>,
    pub loader: VotLoaderInit,
    /// Frame index offsets from the reference frame to the search frame.
    pub diff_list: Vec<isize>,
    /// Maximum number of pairs per offset and sequence.
    pub sample_per_diff: Option<usize>,
    pub batch_size: usize,
    pub search_crop: SearchCropInit,
}

impl TrainGeneratorInit {
    /// Fill the options from a configuration file with an optional sequence list.
    pub fn from_config(config: &Config, target_list: Option<PathBuf>) -> Self {
        let Config {
            dataset,
            sampler,
            preprocessor,
            training,
        } = config;

        Self {
            dataset_dir: dataset.dataset_dir.clone(),
            target_list,
            loader: VotLoaderInit {
                image_extension: dataset.image_extension.clone(),
                groundtruth_file: dataset.groundtruth_file.clone(),
            },
            diff_list: sampler.diff_list.clone(),
            sample_per_diff: sampler.sample_per_diff.map(NonZeroUsize::get),
            batch_size: training.batch_size.get(),
            search_crop: SearchCropInit {
                input_size: preprocessor.input_size.to_size(),
                search_rate: preprocessor.search_rate,
                target_frame: preprocessor.target_frame,
            },
        }
    }

    pub fn build(self, mut rng: StdRng) -> Result<TrainGenerator> {
        let Self {
            dataset_dir,
            target_list,
            loader,
            diff_list,
            sample_per_diff,
            batch_size,
            search_crop,
        } = self;

        let loader = loader.build()?;
        let search_crop = Arc::new(search_crop.build()?);

        let names = match &target_list {
            Some(list_file) => read_sequence_list(&dataset_dir, list_file)?,
            None => list_sequence_dirs(&dataset_dir)?,
        };
        let sequences: Vec<Sequence> = names
            .iter()
            .map(|name| {
                let sequence = loader.load_sequence(&dataset_dir, name).with_context(|| {
                    format!(
                        "failed to load sequence '{}' in '{}'",
                        name,
                        dataset_dir.display()
                    )
                })?;
                debug!("loaded {} frames from '{}'", sequence.frames.len(), name);
                Fallible::Ok(sequence)
            })
            .collect::<Result<_>>()?;

        let samples = sample_epoch(&sequences, &diff_list, sample_per_diff, &mut rng);
        let generator = TrainGenerator {
            current: EpochSamples::new(0, batch_size, samples, search_crop.clone())?,
            sequences,
            diff_list,
            sample_per_diff,
            batch_size,
            search_crop,
            rng,
        };

        info!(
            "loaded {} sequences with {} frames from '{}', {} samples in {} batches",
            generator.sequences.len(),
            generator.num_frames(),
            dataset_dir.display(),
            generator.current.samples.len(),
            generator.batch_count()
        );

        Ok(generator)
    }
}

/// Produces shuffled (reference, search, target) batches from VOT sequences.
///
/// Frames are loaded once. Every epoch samples a fresh set of frame pairs
/// from them and shuffles the combined list.
#[derive(Debug)]
pub struct TrainGenerator {
    sequences: Vec<Sequence>,
    diff_list: Vec<isize>,
    sample_per_diff: Option<usize>,
    batch_size: usize,
    search_crop: Arc<SearchCrop>,
    rng: StdRng,
    current: EpochSamples,
}

impl TrainGenerator {
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn num_frames(&self) -> usize {
        self.sequences
            .iter()
            .map(|sequence| sequence.frames.len())
            .sum()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

fn sample_epoch(
    sequences: &[Sequence],
    diff_list: &[isize],
    sample_per_diff: Option<usize>,
    rng: &mut StdRng,
) -> Vec<Sample> {
    let mut samples = vec![];

    for sequence in sequences {
        let pairs = pick_pairs(sequence.frames.len(), diff_list, sample_per_diff, rng);
        if pairs.is_empty() {
            warn!("sequence '{}' yields no frame pairs", sequence.name);
        }

        samples.extend(pairs.into_iter().map(|(reference, search)| Sample {
            reference: sequence.frames[reference].clone(),
            search: sequence.frames[search].clone(),
        }));
    }

    samples.shuffle(rng);
    samples
}

impl BatchSource for TrainGenerator {
    fn batch_count(&self) -> usize {
        self.current.batch_count()
    }

    fn get_batch(&self, index: usize) -> Result<Batch> {
        self.current.get_batch(index)
    }

    fn on_epoch_end(&mut self) {
        let samples = sample_epoch(
            &self.sequences,
            &self.diff_list,
            self.sample_per_diff,
            &mut self.rng,
        );
        let epoch = self.current.epoch + 1;
        debug!("sampled {} pairs for epoch {}", samples.len(), epoch);

        self.current = EpochSamples {
            epoch,
            batch_size: self.batch_size,
            samples: samples.into(),
            search_crop: self.search_crop.clone(),
        };
    }

    fn epoch_samples(&self) -> EpochSamples {
        self.current.clone()
    }
}
