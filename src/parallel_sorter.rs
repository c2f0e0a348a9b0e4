// THEORY:
// The parallel sorter splits one image into horizontal bands of whole rows and sorts
// the bands on a pool of worker tasks. Regions never cross a band boundary (every
// region is a row, a run inside a row, or a column that has been turned into a row),
// so the bands are fully independent and the result is byte-identical to the
// sequential `PixelSorter` with the same configuration.
//
// Flow:
// 1.  **Prepare**: columns are handled by transposing the image so they become rows.
//     Edge segmentation runs once on the whole image, since the Sobel operator needs
//     the neighbors across a band boundary; each band then receives its rows' runs.
//     A whole-image sort has a single region, so it travels as one band.
// 2.  **Dispatch**: each band is copied out into its own packed buffer and sent to a
//     single dispatcher, which hands tasks round-robin to the workers. Every task
//     carries a oneshot sender for its answer.
// 3.  **Sort**: a worker moves the band onto the blocking pool and drives the same
//     region loop the sequential sorter uses.
// 4.  **Reassemble**: all answers are awaited together and pasted back in place.

use crate::core_modules::edge_detection;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::region_enumerator::{ImageEnumerator, RegionEnumerator, RowEnumerator, RunEnumerator};
use crate::error::{SortError, SortResult};
use crate::sorter::{self, Orientation, SortConfig};
use futures::future::join_all;
use log::{debug, info};
use std::ops::{ControlFlow, Range};
use tokio::sync::{mpsc, oneshot};

type RowRuns = Vec<Vec<Range<u32>>>;

/// How a band is cut into regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandLayout {
    /// Every row is one region.
    Rows,
    /// Edge-segmented runs, one list per band row.
    Runs(RowRuns),
    /// The whole band is one region.
    Whole,
}

/// A band of rows waiting to be sorted.
pub struct BandTask {
    pub band: PixelBuffer,
    pub layout: BandLayout,
    pub result_sender: oneshot::Sender<SortResult<SortedBand>>,
}

/// A band after sorting.
#[derive(Debug)]
pub struct SortedBand {
    pub band: PixelBuffer,
    /// Number of regions sorted inside the band.
    pub regions: usize,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<BandTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one) and their dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(size: usize, config: SortConfig) -> Self {
        let size = size.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<BandTask>();
        let mut workers = Vec::with_capacity(size);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::unbounded_channel::<BandTask>()).unzip();

        // A single dispatcher hands tasks round-robin to the workers.
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                // A dropped task drops its oneshot sender, which the caller sees as an error.
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % size;
            }
        });

        for mut worker_receiver in worker_receivers {
            let worker_config = config.clone();

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let BandTask {
                        band,
                        layout,
                        result_sender,
                    } = task;
                    let band_config = worker_config.clone();
                    let sorted = tokio::task::spawn_blocking(move || Self::sort_band_worker(band, layout, &band_config))
                        .await
                        .map_err(|_| SortError::WorkerPool("band sort task panicked"));
                    let _ = result_sender.send(sorted);
                }
            });

            workers.push(worker);
        }

        Self { task_sender, workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    fn sort_band_worker(mut band: PixelBuffer, layout: BandLayout, config: &SortConfig) -> SortedBand {
        let bounds = band.bounds();
        let mut enumerator: Box<dyn RegionEnumerator> = match &layout {
            BandLayout::Rows => Box::new(RowEnumerator::new(bounds)),
            BandLayout::Runs(runs) => Box::new(RunEnumerator::new(bounds, runs)),
            BandLayout::Whole => Box::new(ImageEnumerator::new(bounds)),
        };
        let regions = match sorter::sort_regions(band.as_bytes_mut(), enumerator.as_mut(), config, |_| {
            ControlFlow::Continue(())
        }) {
            ControlFlow::Continue(regions) | ControlFlow::Break(regions) => regions,
        };
        SortedBand { band, regions }
    }

    /// Queues one band and waits for it to come back sorted.
    ///
    /// Bands are packed copies, so `BandLayout::Whole` is always accepted.
    pub async fn sort_band(&self, band: PixelBuffer, layout: BandLayout) -> SortResult<SortedBand> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = BandTask {
            band,
            layout,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| SortError::WorkerPool("failed to send band to worker pool"))?;

        result_receiver
            .await
            .map_err(|_| SortError::WorkerPool("failed to receive band from worker"))?
    }
}

/// Sorts whole images band by band on a `WorkerPool`.
pub struct ParallelSorter {
    config: SortConfig,
    worker_pool: WorkerPool,
}

impl ParallelSorter {
    /// A sorter with `config.workers` workers, or one per CPU when that is 0.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: SortConfig) -> Self {
        let workers = match config.workers {
            0 => num_cpus::get(),
            workers => workers,
        };
        let worker_pool = WorkerPool::new(workers, config.clone());
        Self { config, worker_pool }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.worker_pool.size()
    }

    /// Sorts every region of `image` and hands it back, stride preserved.
    pub async fn sort(&self, mut image: PixelBuffer) -> SortResult<PixelBuffer> {
        if image.is_empty() {
            debug!("empty {}x{} image, nothing to sort", image.width(), image.height());
            return Ok(image);
        }
        info!(
            "sorting {}x{} image by {} ({} orientation) on {} workers",
            image.width(),
            image.height(),
            self.config.metric,
            self.config.orientation,
            self.workers()
        );

        let regions = match self.config.orientation {
            Orientation::Row => self.sort_bands(&mut image, None).await?,
            Orientation::Column => {
                let mut columns = image.transposed();
                let regions = self.sort_bands(&mut columns, None).await?;
                image.copy_pixels_from(&columns.transposed());
                regions
            }
            Orientation::Edge => {
                let segmentation = edge_detection::segment(&image, self.config.threshold);
                info!("edge threshold {}", segmentation.threshold);
                self.sort_bands(&mut image, Some(segmentation.runs)).await?
            }
            Orientation::Image => {
                let whole = image.band(0..image.height());
                let sorted = self.worker_pool.sort_band(whole, BandLayout::Whole).await?;
                image.paste_band(0, &sorted.band);
                sorted.regions
            }
        };

        let settled = sorter::settle(&mut image, &self.config);
        info!("sorted {regions} regions, {settled} neighbor swaps");
        Ok(image)
    }

    async fn sort_bands(&self, image: &mut PixelBuffer, runs: Option<RowRuns>) -> SortResult<usize> {
        let height = image.height();
        let band_height = height.div_ceil(self.workers() as u32).max(1);
        let bands: Vec<Range<u32>> = (0..height)
            .step_by(band_height as usize)
            .map(|top| top..(top + band_height).min(height))
            .collect();
        debug!("{} bands of up to {band_height} rows", bands.len());

        let pending = bands.iter().map(|rows| {
            let layout = match &runs {
                Some(runs) => BandLayout::Runs(runs[rows.start as usize..rows.end as usize].to_vec()),
                None => BandLayout::Rows,
            };
            self.worker_pool.sort_band(image.band(rows.clone()), layout)
        });
        let results = join_all(pending).await;

        let mut regions = 0;
        for (rows, result) in bands.iter().zip(results) {
            let sorted = result?;
            image.paste_band(rows.start, &sorted.band);
            regions += sorted.regions;
        }
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_metric::MetricKind;
    use crate::core_modules::edge_detection::EdgeThreshold;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::region_sorter::ExchangePolicy;
    use crate::sorter::{PixelSorter, Sorter};

    fn noise(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            let seed = (x * 7919 + y * 104_729) ^ (x * y * 31);
            Pixel::new(seed as u8, (seed >> 3) as u8, (seed >> 6) as u8, 255)
        })
    }

    fn sequential(image: PixelBuffer, config: SortConfig) -> PixelBuffer {
        let mut sorter = PixelSorter::new(image, config);
        sorter.sort().expect("sequential sort");
        sorter.into_image()
    }

    #[tokio::test]
    async fn parallel_rows_match_sequential_rows() {
        let config = SortConfig {
            metric: MetricKind::Intensity,
            workers: 3,
            ..SortConfig::default()
        };
        let parallel = ParallelSorter::new(config.clone());
        assert_eq!(parallel.workers(), 3);
        let sorted = parallel.sort(noise(23, 10)).await.expect("parallel sort");
        assert_eq!(sorted, sequential(noise(23, 10), config));
    }

    #[tokio::test]
    async fn parallel_columns_keep_the_stride() {
        let config = SortConfig {
            orientation: Orientation::Column,
            metric: MetricKind::HueComposite,
            workers: 4,
            ..SortConfig::default()
        };
        let packed = noise(5, 9);
        let mut padded_bytes = Vec::new();
        for y in 0..packed.height() {
            padded_bytes.extend_from_slice(packed.row(y));
            padded_bytes.extend_from_slice(&[0xAB; 8]);
        }
        let padded = PixelBuffer::new(5, 9, 28, padded_bytes).expect("valid geometry");

        let sorted = ParallelSorter::new(config.clone()).sort(padded.clone()).await.expect("parallel sort");
        assert_eq!(sorted.stride(), 28);
        assert_eq!(sorted, sequential(padded, config));
    }

    #[tokio::test]
    async fn parallel_edges_and_smear_match_sequential() {
        let config = SortConfig {
            orientation: Orientation::Edge,
            metric: MetricKind::Luminance,
            threshold: EdgeThreshold::Auto,
            exchange: ExchangePolicy::Smear,
            cache_keys: false,
            workers: 2,
            ..SortConfig::default()
        };
        let sorted = ParallelSorter::new(config.clone()).sort(noise(16, 7)).await.expect("parallel sort");
        assert_eq!(sorted, sequential(noise(16, 7), config));
    }

    #[tokio::test]
    async fn more_workers_than_rows_still_sorts() {
        let config = SortConfig {
            workers: 8,
            ..SortConfig::default()
        };
        let sorted = ParallelSorter::new(config.clone()).sort(noise(6, 2)).await.expect("parallel sort");
        assert_eq!(sorted, sequential(noise(6, 2), config));
    }

    #[tokio::test]
    async fn empty_images_come_back_unchanged() {
        let sorter = ParallelSorter::new(SortConfig {
            workers: 2,
            ..SortConfig::default()
        });
        let empty = PixelBuffer::filled(4, 0, Pixel::default());
        assert_eq!(sorter.sort(empty.clone()).await.expect("parallel sort"), empty);
    }

    #[tokio::test]
    async fn pool_answers_every_band() {
        let pool = WorkerPool::new(2, SortConfig::default());
        let sorted = pool.sort_band(noise(4, 3), BandLayout::Rows).await.expect("band sort");
        assert_eq!(sorted.regions, 3);
        assert_eq!((sorted.band.width(), sorted.band.height()), (4, 3));

        let whole = pool.sort_band(noise(4, 3), BandLayout::Whole).await.expect("band sort");
        assert_eq!(whole.regions, 1);
    }

    #[tokio::test]
    async fn parallel_whole_image_matches_sequential() {
        let config = SortConfig {
            orientation: Orientation::Image,
            metric: MetricKind::Intensity,
            workers: 3,
            ..SortConfig::default()
        };
        let packed = noise(7, 5);
        let mut padded_bytes = Vec::new();
        for y in 0..packed.height() {
            padded_bytes.extend_from_slice(packed.row(y));
            padded_bytes.extend_from_slice(&[0xCD; 4]);
        }
        let padded = PixelBuffer::new(7, 5, 32, padded_bytes).expect("valid geometry");

        let sorted = ParallelSorter::new(config.clone()).sort(padded.clone()).await.expect("parallel sort");
        assert_eq!(sorted.stride(), 32);
        assert_eq!(sorted, sequential(padded, config.clone()));
        assert_eq!(
            ParallelSorter::new(config.clone()).sort(noise(7, 5)).await.expect("parallel sort"),
            sequential(noise(7, 5), config)
        );
    }
}
