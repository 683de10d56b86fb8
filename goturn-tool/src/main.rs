use anyhow::{format_err, Context, Result};
use clap::Parser;
use goturn::{
    config::{Config, DatasetConfig},
    dataset::{list_sequence_dirs, read_sequence_list, SplitInit, VotLoaderInit},
    generator::{BatchSource, TrainGenerator, TrainGeneratorInit},
    loader::ParallelLoader,
    processor::pair_count,
};
use noisy_float::prelude::*;
use prettytable::{cell, row, Table};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    env,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
/// GOTURN dataset tools
enum Opts {
    /// Randomly split sequences into training and validation lists
    Split {
        /// dataset directory
        dataset_dir: PathBuf,
        #[clap(long, default_value = "0.8")]
        /// fraction of sequences used for training
        train_ratio: f64,
        #[clap(long)]
        /// random seed
        seed: Option<u64>,
    },
    /// Print sequence statistics
    Info {
        #[clap(long, default_value = "train.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Load every batch of the configured epochs
    Scan {
        #[clap(long, default_value = "train.json5")]
        /// configuration file
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Opts::parse() {
        Opts::Split {
            dataset_dir,
            train_ratio,
            seed,
        } => {
            split(&dataset_dir, train_ratio, seed)?;
        }
        Opts::Info { config_file } => {
            print_info(&config_file)?;
        }
        Opts::Scan { config_file } => {
            scan(&config_file).await?;
        }
    }

    Ok(())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn split(dataset_dir: &Path, train_ratio: f64, seed: Option<u64>) -> Result<()> {
    let train_ratio = R64::try_new(train_ratio)
        .ok_or_else(|| format_err!("invalid train ratio {}", train_ratio))?;
    let init = SplitInit {
        train_ratio,
        ..Default::default()
    };
    init.split(dataset_dir, &mut make_rng(seed))?;
    Ok(())
}

fn print_info(config_file: &Path) -> Result<()> {
    let config = Config::open(config_file)?;
    let DatasetConfig {
        dataset_dir,
        train_list,
        valid_list,
        image_extension,
        groundtruth_file,
    } = &config.dataset;
    let loader = VotLoaderInit {
        image_extension: image_extension.clone(),
        groundtruth_file: groundtruth_file.clone(),
    }
    .build()?;
    let diff_list = &config.sampler.diff_list;
    let sample_per_diff = config.sampler.sample_per_diff.map(NonZeroUsize::get);

    // group sequences by the list files, or take all directories
    let mut subsets = vec![];
    if train_list.is_none() && valid_list.is_none() {
        subsets.push(("all", list_sequence_dirs(dataset_dir)?));
    }
    for (subset, list_file) in [("train", train_list), ("valid", valid_list)] {
        if let Some(list_file) = list_file {
            subsets.push((subset, read_sequence_list(dataset_dir, list_file)?));
        }
    }

    let mut table = Table::new();
    table.add_row(row!["subset", "sequence", "frames", "pairs"]);

    for (subset, names) in subsets {
        let mut total_frames = 0;
        let mut total_pairs = 0;

        for name in names {
            let sequence = loader
                .load_sequence(dataset_dir, &name)
                .with_context(|| format!("failed to load sequence '{}'", name))?;
            let num_frames = sequence.frames.len();
            let num_pairs = pair_count(num_frames, diff_list, sample_per_diff);
            total_frames += num_frames;
            total_pairs += num_pairs;
            table.add_row(row![subset, name, num_frames, num_pairs]);
        }

        table.add_row(row![subset, "(total)", total_frames, total_pairs]);
    }

    table.printstd();
    Ok(())
}

async fn scan(config_file: &Path) -> Result<()> {
    let config = Config::open(config_file)?;
    let loader = ParallelLoader::new(config.training.num_workers.map(NonZeroUsize::get))?;
    let mut rng = make_rng(config.training.seed);
    info!("use {} loading workers", loader.num_workers());

    let mut train_generator =
        TrainGeneratorInit::from_config(&config, config.dataset.train_list.clone())
            .build(StdRng::from_rng(&mut rng)?)?;
    scan_generator("train", &loader, &mut train_generator, config.training.epochs).await?;

    if let Some(valid_list) = &config.dataset.valid_list {
        let mut valid_generator = TrainGeneratorInit::from_config(&config, Some(valid_list.clone()))
            .build(StdRng::from_rng(&mut rng)?)?;
        scan_generator("valid", &loader, &mut valid_generator, 1).await?;
    }

    Ok(())
}

async fn scan_generator(
    name: &str,
    loader: &ParallelLoader,
    generator: &mut TrainGenerator,
    epochs: usize,
) -> Result<()> {
    let batch_count = generator.batch_count();
    let since = Instant::now();
    let mut num_batches = 0;
    let mut num_samples = 0;

    loader
        .run(generator, epochs, |record| {
            if record.index == 0 {
                info!("{}: start epoch {}", name, record.epoch);
            }
            num_batches += 1;
            num_samples += record.batch.len();
            Ok(())
        })
        .await?;

    let elapsed = since.elapsed().as_secs_f64();
    info!(
        "{}: loaded {} batches ({} per epoch) with {} samples in {:.2}s, {:.1} batches/s",
        name,
        num_batches,
        batch_count,
        num_samples,
        elapsed,
        num_batches as f64 / elapsed.max(f64::EPSILON)
    );
    Ok(())
}
