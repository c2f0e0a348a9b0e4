// THEORY:
// This file is the entry point for the `pixel_sort` library crate. It exposes the
// region-sort engine: an RGBA buffer is partitioned into regions (rows, columns or
// edge-delimited runs) and every region is reordered in place by a color metric.
//
// The public surface is the orchestration layer (`PixelSorter`, `ParallelSorter`
// and `SortConfig`). The building blocks in `core_modules` stay public so callers can
// drive a single region or write their own enumerator, but most users never need
// them.

pub mod core_modules;
pub mod error;
pub mod parallel_sorter;
pub mod sorter;

pub use crate::core_modules::color_metric::{ColorMetric, MetricKind};
pub use crate::core_modules::edge_detection::EdgeThreshold;
pub use crate::core_modules::pixel::pixel::Pixel;
pub use crate::core_modules::pixel_buffer::PixelBuffer;
pub use crate::core_modules::region_sorter::ExchangePolicy;
pub use crate::error::{SortError, SortResult};
pub use crate::parallel_sorter::ParallelSorter;
pub use crate::sorter::{Orientation, PixelSorter, SortConfig, Sorter};
