// THEORY:
// The `sorter` module is the top-level API of the engine. It owns one image for the
// duration of a run and composes the lower layers into a single call:
//
//     enumerator --span--> bind to buffer --Region--> RegionSorter<metric> --sort-->
//
// One span is bound at a time, so exactly one region borrows the buffer mutably at any
// moment, and each region is sorted to completion before the enumerator moves on. The
// orchestrator decides *which* regions exist (orientation) and *how* they are sorted
// (metric, key cache, exchange policy); it never looks at pixels itself.
//
// Configuration follows the same shape everywhere: a plain struct with public fields
// and defaults, with string parsing for each field so it can come from the
// environment or a command line.

use crate::core_modules::color_metric::MetricKind;
use crate::core_modules::edge_detection::{self, EdgeThreshold};
use crate::core_modules::neighbor_settle;
use crate::core_modules::pixel::pixel::Byte;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::region::{RegionShape, RegionSpan};
use crate::core_modules::region_enumerator::{
    ColumnEnumerator, ImageEnumerator, RegionEnumerator, RowEnumerator, RunEnumerator,
};
use crate::core_modules::region_sorter::{ExchangePolicy, RegionSorter};
use crate::error::{SortError, SortResult};
use log::{debug, info};
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

/// Which regions the image is partitioned into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Every row is one region.
    #[default]
    Row,
    /// Every column is one region.
    Column,
    /// Rows are cut into runs at detected edges.
    Edge,
    /// The whole image is one region, read row-major.
    Image,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Row => "row",
            Orientation::Column => "column",
            Orientation::Edge => "edge",
            Orientation::Image => "image",
        })
    }
}

impl FromStr for Orientation {
    type Err = SortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "row" | "rows" | "horizontal" => Ok(Orientation::Row),
            "column" | "columns" | "vertical" => Ok(Orientation::Column),
            "edge" | "edges" => Ok(Orientation::Edge),
            "image" | "whole" => Ok(Orientation::Image),
            _ => Err(SortError::InvalidOption {
                option: "orientation",
                value: value.to_string(),
            }),
        }
    }
}

pub const ENV_ORIENTATION: &str = "PIXEL_SORT_ORIENTATION";
pub const ENV_METRIC: &str = "PIXEL_SORT_METRIC";
pub const ENV_THRESHOLD: &str = "PIXEL_SORT_THRESHOLD";
pub const ENV_CACHE: &str = "PIXEL_SORT_CACHE";
pub const ENV_SMEAR: &str = "PIXEL_SORT_SMEAR";
pub const ENV_WORKERS: &str = "PIXEL_SORT_WORKERS";
pub const ENV_SETTLE: &str = "PIXEL_SORT_SETTLE";

/// Configuration for a sort run.
#[derive(Debug, Clone, PartialEq)]
pub struct SortConfig {
    pub orientation: Orientation,
    pub metric: MetricKind,
    /// Only consulted by `Orientation::Edge`.
    pub threshold: EdgeThreshold,
    /// Compute every key once per region instead of on every comparison.
    pub cache_keys: bool,
    pub exchange: ExchangePolicy,
    /// Worker tasks for the parallel sorter. 0 means one per CPU; 1 means sequential.
    pub workers: usize,
    /// Neighbor-settle passes applied after region sorting. 0 disables the effect.
    pub settle_passes: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            metric: MetricKind::default(),
            threshold: EdgeThreshold::default(),
            cache_keys: true,
            exchange: ExchangePolicy::default(),
            workers: 1,
            settle_passes: 0,
        }
    }
}

impl SortConfig {
    /// Defaults overridden by any `PIXEL_SORT_*` variable that is set.
    pub fn from_env() -> SortResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SortResult<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_ORIENTATION) {
            config.orientation = value.parse()?;
        }
        if let Some(value) = lookup(ENV_METRIC) {
            config.metric = value.parse()?;
        }
        if let Some(value) = lookup(ENV_THRESHOLD) {
            config.threshold = value.parse()?;
        }
        if let Some(value) = lookup(ENV_CACHE) {
            config.cache_keys = parse_flag("key cache", &value)?;
        }
        if let Some(value) = lookup(ENV_SMEAR) {
            config.exchange = value.parse()?;
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            config.workers = parse_workers(&value)?;
        }
        if let Some(value) = lookup(ENV_SETTLE) {
            config.settle_passes = value.trim().parse().map_err(|_| SortError::InvalidOption {
                option: "settle passes",
                value: value.clone(),
            })?;
        }
        Ok(config)
    }
}

fn parse_flag(option: &'static str, value: &str) -> SortResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(SortError::InvalidOption {
            option,
            value: value.to_string(),
        }),
    }
}

fn parse_workers(value: &str) -> SortResult<usize> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("auto") {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| SortError::InvalidOption {
        option: "workers",
        value: value.to_string(),
    })
}

/// Anything that sorts an image it owns.
pub trait Sorter {
    /// Sorts every region of the image in place.
    fn sort(&mut self) -> SortResult<()>;

    /// The image, sorted or not.
    fn image(&self) -> &PixelBuffer;
}

/// The sequential region-sort engine.
pub struct PixelSorter {
    image: PixelBuffer,
    config: SortConfig,
    /// Threshold applied by the last edge-segmented run.
    last_threshold: Option<u8>,
}

impl PixelSorter {
    pub fn new(image: PixelBuffer, config: SortConfig) -> Self {
        Self {
            image,
            config,
            last_threshold: None,
        }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// The edge threshold the last `Orientation::Edge` run actually used.
    pub fn last_threshold(&self) -> Option<u8> {
        self.last_threshold
    }

    pub fn into_image(self) -> PixelBuffer {
        self.image
    }

    /// Sorts region by region, calling `on_region` after each one.
    ///
    /// Returning `ControlFlow::Break` from the callback stops before the next region;
    /// regions already sorted stay sorted and nothing else in the image is touched
    /// (neighbor settle is skipped too). Returns the number of regions sorted.
    pub fn sort_with(&mut self, on_region: impl FnMut(RegionShape) -> ControlFlow<()>) -> usize {
        if self.image.is_empty() {
            debug!("empty {}x{} image, nothing to sort", self.image.width(), self.image.height());
            return 0;
        }

        info!(
            "sorting {}x{} image by {} ({} orientation)",
            self.image.width(),
            self.image.height(),
            self.config.metric,
            self.config.orientation
        );
        let flow = if self.config.orientation == Orientation::Image && !self.image.is_packed() {
            // Padding would sit between rows of a single span; sort a packed copy.
            let mut packed = self.image.band(0..self.image.height());
            let mut enumerator = ImageEnumerator::new(packed.bounds());
            let flow = sort_regions(packed.as_bytes_mut(), &mut enumerator, &self.config, on_region);
            self.image.paste_band(0, &packed);
            flow
        } else {
            let mut enumerator = self.enumerator();
            sort_regions(self.image.as_bytes_mut(), enumerator.as_mut(), &self.config, on_region)
        };

        match flow {
            ControlFlow::Continue(sorted) => {
                let settled = settle(&mut self.image, &self.config);
                info!("sorted {sorted} regions, {settled} neighbor swaps");
                sorted
            }
            ControlFlow::Break(sorted) => {
                info!("stopped after {sorted} regions");
                sorted
            }
        }
    }

    fn enumerator(&mut self) -> Box<dyn RegionEnumerator> {
        let bounds = self.image.bounds();
        match self.config.orientation {
            Orientation::Row => Box::new(RowEnumerator::new(bounds)),
            Orientation::Column => Box::new(ColumnEnumerator::new(bounds)),
            Orientation::Edge => {
                let segmentation = edge_detection::segment(&self.image, self.config.threshold);
                self.last_threshold = Some(segmentation.threshold);
                Box::new(RunEnumerator::new(bounds, &segmentation.runs))
            }
            Orientation::Image => Box::new(ImageEnumerator::new(bounds)),
        }
    }
}

impl Sorter for PixelSorter {
    fn sort(&mut self) -> SortResult<()> {
        self.sort_with(|_| ControlFlow::Continue(()));
        Ok(())
    }

    fn image(&self) -> &PixelBuffer {
        &self.image
    }
}

/// Sorts one span of `bytes` to completion with the configured metric and policy.
pub(crate) fn sort_span(bytes: &mut [Byte], span: RegionSpan, config: &SortConfig) {
    let region = span.bind(bytes);
    let sorter = if config.cache_keys {
        RegionSorter::new(region, config.metric)
    } else {
        RegionSorter::uncached(region, config.metric)
    };
    sorter.with_policy(config.exchange).sort();
}

/// Drives `enumerator` from the start, sorting every span it yields.
///
/// Returns the number of regions sorted, as `Break` when `on_region` stopped the run.
pub(crate) fn sort_regions(
    bytes: &mut [Byte],
    enumerator: &mut dyn RegionEnumerator,
    config: &SortConfig,
    mut on_region: impl FnMut(RegionShape) -> ControlFlow<()>,
) -> ControlFlow<usize, usize> {
    enumerator.reset();
    let mut sorted = 0;
    while let Some(span) = enumerator.next() {
        sort_span(bytes, span, config);
        sorted += 1;
        if on_region(span.shape).is_break() {
            return ControlFlow::Break(sorted);
        }
    }
    ControlFlow::Continue(sorted)
}

/// Runs the neighbor-settle effect when the config asks for it.
pub(crate) fn settle(image: &mut PixelBuffer, config: &SortConfig) -> usize {
    if config.settle_passes == 0 {
        return 0;
    }
    neighbor_settle::settle(image, &config.metric, config.settle_passes)
}
