use anyhow::Result;
use approx::assert_abs_diff_eq;
use bbox::{calc_search_area, encode, Size, XYXY};
use goturn::{
    dataset::VotLoaderInit,
    generator::{Batch, BatchSource, EpochSamples, TrainGenerator, TrainGeneratorInit},
    loader::ParallelLoader,
    processor::{SearchCropInit, TargetFrame},
};
use image::{Rgb, RgbImage};
use rand::{rngs::StdRng, SeedableRng};
use std::{fmt::Write as _, fs, path::Path};

const IMAGE_W: u32 = 64;
const IMAGE_H: u32 = 48;
const INPUT_SIZE: u32 = 16;

fn frame_bbox(index: usize) -> [f64; 4] {
    let shift = (index % 5) as f64;
    [10.0 + shift, 12.0, 30.0 + shift, 28.0]
}

fn write_sequence(dataset_dir: &Path, name: &str, num_frames: usize) {
    let dir = dataset_dir.join(name);
    fs::create_dir_all(&dir).unwrap();

    let mut groundtruth = String::new();
    for index in 0..num_frames {
        let shade = (index % 256) as u8;
        RgbImage::from_pixel(IMAGE_W, IMAGE_H, Rgb([shade, 64, 128]))
            .save(dir.join(format!("{:08}.png", index + 1)))
            .unwrap();

        // polygon rows, clockwise from the top-left corner
        let [x0, y0, x1, y1] = frame_bbox(index);
        writeln!(
            groundtruth,
            "{},{},{},{},{},{},{},{}",
            x0, y0, x1, y0, x1, y1, x0, y1
        )
        .unwrap();
    }
    fs::write(dir.join("groundtruth.txt"), groundtruth).unwrap();
}

fn generator_init(
    dataset_dir: &Path,
    diff_list: Vec<isize>,
    batch_size: usize,
) -> TrainGeneratorInit {
    TrainGeneratorInit {
        dataset_dir: dataset_dir.to_owned(),
        target_list: None,
        loader: VotLoaderInit {
            image_extension: "png".into(),
            ..Default::default()
        },
        diff_list,
        sample_per_diff: None,
        batch_size,
        search_crop: SearchCropInit {
            input_size: Size::from_wh([INPUT_SIZE, INPUT_SIZE]),
            ..Default::default()
        },
    }
}

fn build(init: TrainGeneratorInit) -> Result<TrainGenerator> {
    init.build(StdRng::seed_from_u64(0))
}

#[test]
fn batch_accounting() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 101);

    let generator = build(generator_init(dir.path(), vec![1], 32))?;
    let samples = generator.epoch_samples();
    assert_eq!(samples.samples().len(), 100);
    assert_eq!(generator.batch_count(), 4);
    assert_eq!(samples.batch_samples(0)?.len(), 32);
    assert_eq!(samples.batch_samples(3)?.len(), 4);
    assert!(samples.batch_samples(4).is_err());

    let batch = generator.get_batch(3)?;
    assert_eq!(batch.len(), 4);
    let input_size = INPUT_SIZE as usize;
    assert_eq!(batch.reference_images.shape(), &[4, input_size, input_size, 3]);
    assert_eq!(batch.search_images.shape(), &[4, input_size, input_size, 3]);
    assert_eq!(batch.targets.shape(), &[4, 4]);
    assert!(batch
        .reference_images
        .iter()
        .chain(batch.search_images.iter())
        .all(|&value| (-1.0..1.0).contains(&value)));

    assert!(generator.get_batch(4).is_err());
    Ok(())
}

#[test]
fn pairs_follow_diff_list() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 10);

    let generator = build(generator_init(dir.path(), vec![-2, 3], 4))?;
    let samples = generator.epoch_samples();
    assert_eq!(samples.samples().len(), 8 + 7);

    let frames = &generator.sequences()[0].frames;
    let position = |path: &Path| frames.iter().position(|frame| frame.image_path == path);
    for sample in samples.samples() {
        let reference = position(&sample.reference.image_path).unwrap() as isize;
        let search = position(&sample.search.image_path).unwrap() as isize;
        assert!([-2, 3].contains(&(search - reference)));
    }
    Ok(())
}

#[test]
fn targets_encode_reference_box() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 12);

    for target_frame in [TargetFrame::Reference, TargetFrame::Search] {
        let mut init = generator_init(dir.path(), vec![-1, 1], 5);
        init.search_crop.target_frame = target_frame;
        let generator = build(init)?;
        let samples = generator.epoch_samples();
        let image_size = Size::from_wh([IMAGE_W, IMAGE_H]);

        for index in 0..samples.batch_count() {
            let batch = samples.get_batch(index)?;
            let pairs = samples.batch_samples(index)?;
            for (sample, target) in pairs.iter().zip(batch.targets.outer_iter()) {
                let area = calc_search_area(&sample.reference.bbox, &image_size, 0.8);
                let bbox: &XYXY<f64> = match target_frame {
                    TargetFrame::Reference => &sample.reference.bbox,
                    TargetFrame::Search => &sample.search.bbox,
                };
                let expect = encode(bbox, &area).to_array();
                for (&lhs, rhs) in target.iter().zip(expect) {
                    assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-6);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn epoch_end_resamples() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 40);

    let mut init = generator_init(dir.path(), vec![-1, 1], 8);
    init.sample_per_diff = Some(10);
    let mut generator = build(init)?;

    let first = generator.epoch_samples();
    assert_eq!(first.epoch(), 0);
    assert_eq!(first.samples().len(), 20);

    generator.on_epoch_end();
    let second = generator.epoch_samples();
    assert_eq!(second.epoch(), 1);
    assert_eq!(second.samples().len(), 20);
    assert_eq!(generator.batch_count(), 3);

    // a snapshot taken before the epoch boundary remains usable
    assert_eq!(first.get_batch(2)?.len(), 4);
    Ok(())
}

#[test]
fn seeded_generators_agree() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 30);

    let paths = |generator: &TrainGenerator| -> Vec<_> {
        generator
            .epoch_samples()
            .samples()
            .iter()
            .map(|sample| (sample.reference.image_path.clone(), sample.search.image_path.clone()))
            .collect()
    };

    let lhs = build(generator_init(dir.path(), vec![-1, 1], 8))?;
    let rhs = build(generator_init(dir.path(), vec![-1, 1], 8))?;
    assert_eq!(paths(&lhs), paths(&rhs));
    Ok(())
}

#[test]
fn sequence_list_and_short_sequences() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "ball", 6);
    write_sequence(dir.path(), "car", 9);
    write_sequence(dir.path(), "single", 1);
    fs::write(dir.path().join("list_train.txt"), "car\nsingle\n")?;

    let generator = build(generator_init(dir.path(), vec![1], 4))?;
    assert_eq!(generator.sequences().len(), 3);
    assert_eq!(generator.num_frames(), 16);
    assert_eq!(generator.epoch_samples().samples().len(), 5 + 8);

    let mut init = generator_init(dir.path(), vec![1], 4);
    init.target_list = Some("list_train.txt".into());
    let generator = build(init)?;
    let names: Vec<_> = generator.sequences().iter().map(|seq| seq.name.as_str()).collect();
    assert_eq!(names, vec!["car", "single"]);
    assert_eq!(generator.epoch_samples().samples().len(), 8);
    Ok(())
}

#[test]
fn empty_dataset_has_no_batches() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "single", 1);

    let generator = build(generator_init(dir.path(), vec![-1, 1], 4))?;
    assert_eq!(generator.batch_count(), 0);
    assert!(generator.get_batch(0).is_err());
    Ok(())
}

#[test]
fn broken_sequences_fail_fast() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 5);
    fs::write(dir.path().join("seq").join("groundtruth.txt"), "1,2,3,4\n")?;
    assert!(build(generator_init(dir.path(), vec![1], 4)).is_err());

    let mut init = generator_init(dir.path(), vec![1], 4);
    init.batch_size = 0;
    assert!(build(init).is_err());
    Ok(())
}

#[test]
fn missing_frame_fails_batch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 3);

    let generator = build(generator_init(dir.path(), vec![1], 8))?;
    fs::remove_file(dir.path().join("seq").join("00000002.png"))?;
    assert!(generator.get_batch(0).is_err());
    Ok(())
}

#[tokio::test]
async fn loader_streams_batches_in_order() -> Result<()> {
    use futures::StreamExt as _;

    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 23);

    let mut generator = build(generator_init(dir.path(), vec![1], 5))?;
    let loader = ParallelLoader::new(Some(3))?;

    let records: Vec<_> = loader
        .epoch_stream(generator.epoch_samples())
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_>>()?;
    let indexes: Vec<_> = records.iter().map(|record| record.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
    assert_eq!(records[4].batch.len(), 2);

    let mut seen = vec![];
    loader
        .run(&mut generator, 2, |record| {
            seen.push((record.epoch, record.index, record.batch.len()));
            Ok(())
        })
        .await?;
    assert_eq!(seen.len(), 10);
    assert_eq!(seen[0], (0, 0, 5));
    assert_eq!(seen[9], (1, 4, 2));
    assert_eq!(generator.epoch_samples().epoch(), 2);
    Ok(())
}

/// Counts epoch boundaries of the wrapped generator.
struct CountingSource {
    inner: TrainGenerator,
    epoch_ends: usize,
}

impl BatchSource for CountingSource {
    fn batch_count(&self) -> usize {
        self.inner.batch_count()
    }

    fn get_batch(&self, index: usize) -> Result<Batch> {
        self.inner.get_batch(index)
    }

    fn on_epoch_end(&mut self) {
        self.epoch_ends += 1;
        self.inner.on_epoch_end();
    }

    fn epoch_samples(&self) -> EpochSamples {
        self.inner.epoch_samples()
    }
}

#[tokio::test]
async fn loader_drives_any_batch_source() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_sequence(dir.path(), "seq", 9);

    let mut source = CountingSource {
        inner: build(generator_init(dir.path(), vec![1], 3))?,
        epoch_ends: 0,
    };
    let loader = ParallelLoader::new(Some(2))?;

    let mut num_batches = 0;
    loader
        .run(&mut source, 3, |record| {
            assert_eq!(record.epoch, num_batches / 3);
            num_batches += 1;
            Ok(())
        })
        .await?;
    assert_eq!(num_batches, 9);
    assert_eq!(source.epoch_ends, 3);

    let dyn_source: &mut dyn BatchSource = &mut source;
    loader.run(dyn_source, 1, |_| Ok(())).await?;
    assert_eq!(source.epoch_ends, 4);
    Ok(())
}
