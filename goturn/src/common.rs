pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{prelude::*, EncodedBox, SearchArea, Size, XYXY};
pub use futures::{
    future::FutureExt as _,
    stream::{self, Stream, StreamExt as _},
};
pub use image::{
    imageops::{self, FilterType},
    RgbImage,
};
pub use itertools::Itertools as _;
pub use ndarray::{Array2, Array3, Array4, ArrayView4, Axis};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng, seq::SliceRandom};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    pin::Pin,
    sync::Arc,
};
pub use tracing::{debug, info, warn};

pub type Fallible<T> = Result<T, Error>;
