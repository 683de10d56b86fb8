use anyhow::Result;
use goturn::{config::Config, generator::TrainGeneratorInit, processor::TargetFrame};
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    static ref CONFIG_DIR: PathBuf =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cfg");
}

#[test]
fn load_full_config() -> Result<()> {
    let config = Config::open(CONFIG_DIR.join("train.json5"))?;

    assert_eq!(config.dataset.dataset_dir, Path::new("/data/vot2014"));
    assert_eq!(
        config.dataset.valid_list.as_deref(),
        Some(Path::new("list_valid.txt"))
    );
    assert_eq!(config.sampler.diff_list, vec![-2, -1, 1, 2]);
    assert_eq!(config.preprocessor.target_frame, TargetFrame::Search);
    assert_eq!(config.training.seed, Some(42));

    let init = TrainGeneratorInit::from_config(&config, config.dataset.train_list.clone());
    assert_eq!(init.target_list, Some(PathBuf::from("list_train.txt")));
    assert_eq!(init.sample_per_diff, Some(50));
    assert_eq!(init.batch_size, 32);
    assert_eq!(init.search_crop.input_size.w(), 227);
    assert_eq!(init.search_crop.input_size.h(), 227);
    assert_eq!(init.search_crop.search_rate, 1.0);
    Ok(())
}

#[test]
fn load_minimal_config_with_defaults() -> Result<()> {
    let config = Config::open(CONFIG_DIR.join("minimal.json5"))?;

    assert_eq!(config.dataset.image_extension, "jpg");
    assert_eq!(config.dataset.groundtruth_file, "groundtruth.txt");
    assert!(config.dataset.train_list.is_none());
    assert_eq!(config.sampler.diff_list, vec![-1, 1]);
    assert!(config.sampler.sample_per_diff.is_none());
    assert_eq!(config.preprocessor.input_size.h.get(), 224);
    assert_eq!(config.preprocessor.search_rate, 0.8);
    assert_eq!(config.preprocessor.target_frame, TargetFrame::Reference);
    assert!(config.training.num_workers.is_none());
    Ok(())
}

#[test]
fn reject_zero_batch_size() {
    let text = r#"{ dataset: { dataset_dir: "d" }, training: { batch_size: 0, epochs: 1 } }"#;
    assert!(json5::from_str::<Config>(text).is_err());
}
