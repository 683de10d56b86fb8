use crate::common::*;

pub const TRAIN_LIST_FILE: &str = "list_train.txt";
pub const VALID_LIST_FILE: &str = "list_valid.txt";

/// List the names of all sequence directories directly under `dataset_dir`, sorted.
pub fn list_sequence_dirs(dataset_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dataset_dir = dataset_dir.as_ref();
    let entries = fs::read_dir(dataset_dir)
        .with_context(|| format!("failed to read directory '{}'", dataset_dir.display()))?;

    let mut names = vec![];
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| format_err!("non-UTF-8 directory name {:?}", name))?;
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Read a list file with one sequence name per line.
///
/// The list path is resolved against `dataset_dir`. Every listed name must
/// be a directory under `dataset_dir`.
pub fn read_sequence_list(
    dataset_dir: impl AsRef<Path>,
    list_file: impl AsRef<Path>,
) -> Result<Vec<String>> {
    let dataset_dir = dataset_dir.as_ref();
    let list_file = dataset_dir.join(list_file);
    let content = fs::read_to_string(&list_file)
        .with_context(|| format!("failed to read list file '{}'", list_file.display()))?;

    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|name| -> Result<_> {
            ensure!(
                dataset_dir.join(name).is_dir(),
                "'{}' listed in '{}' is not a directory under '{}'",
                name,
                list_file.display(),
                dataset_dir.display()
            );
            Ok(name.to_owned())
        })
        .collect()
}

/// Options of the random train/validation partition of sequence directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SplitInit {
    /// The fraction of sequences assigned to training.
    pub train_ratio: R64,
    pub train_list_file: String,
    pub valid_list_file: String,
}

impl Default for SplitInit {
    fn default() -> Self {
        Self {
            train_ratio: r64(0.8),
            train_list_file: TRAIN_LIST_FILE.to_owned(),
            valid_list_file: VALID_LIST_FILE.to_owned(),
        }
    }
}

/// The sorted sequence names of each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainValidSplit {
    pub train: Vec<String>,
    pub valid: Vec<String>,
}

impl SplitInit {
    /// Partition the sequences under `dataset_dir` and write both list files into it.
    pub fn split<R>(&self, dataset_dir: impl AsRef<Path>, rng: &mut R) -> Result<TrainValidSplit>
    where
        R: Rng + ?Sized,
    {
        let dataset_dir = dataset_dir.as_ref();
        let train_ratio = self.train_ratio.raw();
        ensure!(
            (0.0..=1.0).contains(&train_ratio),
            "train_ratio must be in range [0, 1], but get {}",
            train_ratio
        );

        let mut names = list_sequence_dirs(dataset_dir)?;
        names.shuffle(rng);

        let num_train = (names.len() as f64 * train_ratio) as usize;
        let mut valid = names.split_off(num_train);
        let mut train = names;
        train.sort();
        valid.sort();

        write_list(dataset_dir.join(&self.train_list_file), &train)?;
        write_list(dataset_dir.join(&self.valid_list_file), &valid)?;
        info!(
            "split {} sequences into {} train and {} valid in '{}'",
            train.len() + valid.len(),
            train.len(),
            valid.len(),
            dataset_dir.display()
        );

        Ok(TrainValidSplit { train, valid })
    }
}

fn write_list(path: PathBuf, names: &[String]) -> Result<()> {
    let text: String = names.iter().map(|name| format!("{}\n", name)).collect();
    fs::write(&path, text).with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}
