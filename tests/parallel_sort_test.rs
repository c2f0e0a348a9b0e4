use image::{ImageBuffer, Rgba, RgbaImage};
use pixel_sort::{
    EdgeThreshold, ExchangePolicy, MetricKind, Orientation, ParallelSorter, PixelBuffer, PixelSorter, SortConfig,
    Sorter,
};

fn landscape() -> RgbaImage {
    // A sky gradient over a darker, noisier ground.
    ImageBuffer::from_fn(40, 30, |x, y| {
        if y < 12 {
            Rgba([(40 + y * 4) as u8, (90 + y * 3) as u8, 230, 255])
        } else {
            let noise = (x * 73 + y * 151) % 61;
            Rgba([(60 + noise) as u8, (40 + noise / 2) as u8, 20, 255])
        }
    })
}

fn sequential(config: &SortConfig) -> PixelBuffer {
    let mut sorter = PixelSorter::new(PixelBuffer::from(landscape()), config.clone());
    sorter.sort().expect("sequential sort");
    sorter.into_image()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parallel_output_matches_sequential_for_every_orientation() {
    for orientation in [Orientation::Row, Orientation::Column, Orientation::Edge, Orientation::Image] {
        for metric in MetricKind::ALL {
            let config = SortConfig {
                orientation,
                metric,
                threshold: EdgeThreshold::Auto,
                workers: 3,
                ..SortConfig::default()
            };
            let parallel = ParallelSorter::new(config.clone())
                .sort(PixelBuffer::from(landscape()))
                .await
                .expect("parallel sort");
            assert_eq!(parallel, sequential(&config), "{orientation} / {metric} diverged");
        }
    }
}

#[tokio::test]
async fn parallel_settle_matches_sequential_settle() {
    let config = SortConfig {
        metric: MetricKind::Intensity,
        exchange: ExchangePolicy::Smear,
        settle_passes: 2,
        workers: 4,
        ..SortConfig::default()
    };
    let parallel = ParallelSorter::new(config.clone())
        .sort(PixelBuffer::from(landscape()))
        .await
        .expect("parallel sort");
    assert_eq!(parallel, sequential(&config));
}

#[tokio::test]
async fn auto_worker_count_uses_every_cpu() {
    let sorter = ParallelSorter::new(SortConfig {
        workers: 0,
        ..SortConfig::default()
    });
    assert_eq!(sorter.workers(), num_cpus::get().max(1));
}
