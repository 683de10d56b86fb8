//! Concurrent batch loading on the tokio blocking thread pool.

use crate::{
    common::*,
    generator::{Batch, BatchSource, EpochSamples},
};

/// A loaded batch tagged with its position in training.
#[derive(Debug, Clone)]
pub struct TrainingRecord {
    pub epoch: usize,
    pub index: usize,
    pub batch: Batch,
}

/// Fetches the batches of an epoch concurrently while keeping batch order.
#[derive(Debug, Clone)]
pub struct ParallelLoader {
    num_workers: usize,
}

impl ParallelLoader {
    /// Create a loader with at most `num_workers` in-flight batches.
    /// It defaults to the number of CPUs.
    pub fn new(num_workers: Option<usize>) -> Result<Self> {
        let num_workers = num_workers.unwrap_or_else(num_cpus::get);
        ensure!(num_workers > 0, "num_workers must be positive");
        Ok(Self { num_workers })
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Stream the batches of one epoch snapshot in index order.
    ///
    /// Each batch is built on a blocking thread. The snapshot is shared by
    /// the workers, so the generator may start the next epoch once the
    /// stream is dropped.
    pub fn epoch_stream(
        &self,
        samples: EpochSamples,
    ) -> Pin<Box<dyn Stream<Item = Result<TrainingRecord>> + Send>> {
        let epoch = samples.epoch();
        let batch_count = samples.batch_count();

        let stream = stream::iter(0..batch_count)
            .map(move |index| {
                let samples = samples.clone();
                tokio::task::spawn_blocking(move || {
                    let batch = samples.get_batch(index)?;
                    Fallible::Ok(TrainingRecord {
                        epoch,
                        index,
                        batch,
                    })
                })
                .map(|result| Fallible::Ok(result??))
            })
            .buffered(self.num_workers);

        Box::pin(stream)
    }

    /// Iterate `epochs` epochs of the generator, passing every batch to `f` in order.
    ///
    /// The generator moves to the next epoch only after all batches of the
    /// current epoch are consumed. The first error stops the iteration.
    pub async fn run<G, F>(&self, generator: &mut G, epochs: usize, mut f: F) -> Result<()>
    where
        G: BatchSource + ?Sized,
        F: FnMut(TrainingRecord) -> Result<()>,
    {
        for _ in 0..epochs {
            let samples = generator.epoch_samples();
            let epoch = samples.epoch();
            let batch_count = samples.batch_count();
            debug!("start epoch {} with {} batches", epoch, batch_count);

            let mut stream = self.epoch_stream(samples);
            while let Some(record) = stream.next().await {
                f(record?)?;
            }

            generator.on_epoch_end();
        }

        Ok(())
    }
}
