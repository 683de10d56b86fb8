use super::*;
use crate::common::*;

/// The default annotation file name in a sequence directory.
pub const GROUNDTRUTH_FILE: &str = "groundtruth.txt";
/// The default file extension of frame images.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Options to load VOT Challenge style sequence directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VotLoaderInit {
    /// Frame image extension, with or without the leading dot.
    pub image_extension: String,
    /// Annotation file name relative to the sequence directory.
    pub groundtruth_file: String,
}

impl VotLoaderInit {
    pub fn build(self) -> Result<VotLoader> {
        let Self {
            image_extension,
            groundtruth_file,
        } = self;

        let image_extension = image_extension
            .strip_prefix('.')
            .unwrap_or(image_extension.as_str())
            .to_owned();
        ensure!(
            !image_extension.is_empty(),
            "image_extension must not be empty"
        );
        ensure!(
            !groundtruth_file.is_empty(),
            "groundtruth_file must not be empty"
        );

        Ok(VotLoader {
            image_extension,
            groundtruth_file,
        })
    }
}

impl Default for VotLoaderInit {
    fn default() -> Self {
        Self {
            image_extension: DEFAULT_IMAGE_EXTENSION.to_owned(),
            groundtruth_file: GROUNDTRUTH_FILE.to_owned(),
        }
    }
}

/// The loader of VOT Challenge single-target sequences.
///
/// A sequence directory holds the frame images and an annotation file with
/// one CSV row of polygon vertices per frame. Row `i` belongs to the `i`-th
/// image in sorted path order.
#[derive(Debug, Clone)]
pub struct VotLoader {
    image_extension: String,
    groundtruth_file: String,
}

impl VotLoader {
    pub fn load_sequence(&self, dataset_dir: &Path, name: &str) -> Result<Sequence> {
        let frames = self
            .load_frames(dataset_dir.join(name))?
            .into_iter()
            .map(Arc::new)
            .collect();

        Ok(Sequence {
            name: name.to_owned(),
            frames,
        })
    }

    pub fn load_frames(&self, sequence_dir: impl AsRef<Path>) -> Result<Vec<FrameBox>> {
        let sequence_dir = sequence_dir.as_ref();
        let groundtruth_file = sequence_dir.join(&self.groundtruth_file);

        let image_files = self.list_image_files(sequence_dir)?;
        let bboxes = load_groundtruth(&groundtruth_file)?;
        ensure!(
            image_files.len() == bboxes.len(),
            "'{}' has {} rows but '{}' has {} frame images",
            groundtruth_file.display(),
            bboxes.len(),
            sequence_dir.display(),
            image_files.len()
        );

        let frames = image_files
            .into_iter()
            .zip(bboxes)
            .map(|(image_path, bbox)| FrameBox { image_path, bbox })
            .collect();
        Ok(frames)
    }

    /// List frame images recursively, sorted by path relative to the sequence directory.
    pub fn list_image_files(&self, sequence_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let sequence_dir = sequence_dir.as_ref();
        ensure!(
            sequence_dir.is_dir(),
            "'{}' is not a directory",
            sequence_dir.display()
        );
        let dir_str = sequence_dir
            .to_str()
            .ok_or_else(|| format_err!("non-UTF-8 path '{}'", sequence_dir.display()))?;
        let pattern = format!("{}/**/*", glob::Pattern::escape(dir_str));

        let mut files = vec![];
        for entry in glob::glob(&pattern)? {
            let path = entry
                .with_context(|| format!("failed to list images in '{}'", sequence_dir.display()))?;
            if !path.is_file() || !self.has_image_extension(&path) {
                continue;
            }
            let key = path
                .strip_prefix(sequence_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            files.push((key, path));
        }

        files.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    fn has_image_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.image_extension))
            .unwrap_or(false)
    }
}

/// Parse an annotation file into per-row bounding rectangles.
///
/// Every row must be a non-empty, even-length list of finite numbers. Blank
/// lines between rows are rejected since they would shift the row-to-frame
/// pairing. Trailing blank lines are ignored.
pub fn load_groundtruth(path: impl AsRef<Path>) -> Result<Vec<XYXY<f64>>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to open annotation file '{}'", path.display()))?;

    // the csv reader skips empty lines silently, so find them beforehand
    let lines = text.lines().collect_vec();
    let num_rows = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map(|index| index + 1)
        .unwrap_or(0);
    if let Some(index) = lines[..num_rows]
        .iter()
        .position(|line| line.trim().is_empty())
    {
        bail!(
            "unexpected blank line at line {} of '{}'",
            index + 1,
            path.display()
        );
    }

    let rows = lines[..num_rows].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rows.as_bytes());

    reader
        .records()
        .enumerate()
        .map(|(index, record)| -> Result<_> {
            let row = index + 1;
            let record = record
                .with_context(|| format!("failed to read row {} of '{}'", row, path.display()))?;

            let vertices: Vec<f64> = record
                .iter()
                .map(|field| -> Result<f64> {
                    let value: f64 = field.parse().with_context(|| {
                        format!(
                            "invalid vertex value '{}' at row {} of '{}'",
                            field,
                            row,
                            path.display()
                        )
                    })?;
                    ensure!(
                        value.is_finite(),
                        "non-finite vertex value at row {} of '{}'",
                        row,
                        path.display()
                    );
                    Ok(value)
                })
                .collect::<Result<_>>()?;

            XYXY::try_from_polygon(&vertices)
                .with_context(|| format!("invalid polygon at row {} of '{}'", row, path.display()))
        })
        .collect()
}
