// THEORY:
// The `RegionSorter` is where a region, a color metric and the sort contract meet.
// It adapts one `Region` plus one `ColorMetric` into `Sortable`, so the generic sort
// can reorder the region's pixels without knowing what a pixel is.
//
// Key architectural principles:
// 1.  **One Sorter, Many Lenses**: The sorter is generic over the metric. Hue,
//     intensity and luminance orderings are the same code with a different `M`.
// 2.  **Key Cache In Lockstep**: By default every pixel's key is computed once into a
//     cache indexed like the region. `exchange` swaps the four channel bytes and the
//     two cache entries in the same call, so a comparison can never read a key that
//     belongs to a pixel that has moved. With the cache off, keys are recomputed from
//     the raw bytes on every comparison instead.
// 3.  **Explicit Side Effects**: The default exchange is a pure swap. The "smear"
//     exchange, which also drags the moved pixel onto its right-hand neighbor, is an
//     opt-in visual effect and breaks the ordering guarantee when chosen.

use crate::core_modules::color_metric::{ColorMetric, Key};
use crate::core_modules::region::Region;
use crate::core_modules::sort_algorithm::{self, Sortable};
use std::str::FromStr;

use crate::error::SortError;

/// What an exchange does besides swapping the two pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExchangePolicy {
    /// Swap the two pixels and nothing else.
    #[default]
    Swap,
    /// After the swap, copy the pixel now at `j` onto `j + 1` (when it exists).
    Smear,
}

impl FromStr for ExchangePolicy {
    type Err = SortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "swap" | "0" | "false" | "off" => Ok(ExchangePolicy::Swap),
            "smear" | "1" | "true" | "on" => Ok(ExchangePolicy::Smear),
            _ => Err(SortError::InvalidOption {
                option: "exchange policy",
                value: value.to_string(),
            }),
        }
    }
}

/// Per-pixel keys kept in index-correspondence with the region, or none at all.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyCache {
    Cached(Vec<Key>),
    Direct,
}

/// A region bound to a metric, ready to be sorted in place.
pub struct RegionSorter<'a, M: ColorMetric> {
    region: Region<'a>,
    metric: M,
    cache: KeyCache,
    policy: ExchangePolicy,
}

impl<'a, M: ColorMetric> RegionSorter<'a, M> {
    /// A sorter with a key cache and the plain swap policy.
    pub fn new(region: Region<'a>, metric: M) -> Self {
        let keys = region.pixels().map(|pixel| metric.key(&pixel)).collect();
        Self {
            region,
            metric,
            cache: KeyCache::Cached(keys),
            policy: ExchangePolicy::Swap,
        }
    }

    /// A sorter that reads keys straight from the pixel bytes on every comparison.
    pub fn uncached(region: Region<'a>, metric: M) -> Self {
        Self {
            region,
            metric,
            cache: KeyCache::Direct,
            policy: ExchangePolicy::Swap,
        }
    }

    pub fn with_policy(mut self, policy: ExchangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn region(&self) -> &Region<'a> {
        &self.region
    }

    /// The cached keys, when the cache is on.
    pub fn cached_keys(&self) -> Option<&[Key]> {
        match &self.cache {
            KeyCache::Cached(keys) => Some(keys),
            KeyCache::Direct => None,
        }
    }

    /// Key of logical pixel `n`.
    pub fn key(&self, n: usize) -> Key {
        match &self.cache {
            KeyCache::Cached(keys) => keys[n],
            KeyCache::Direct => self.metric.key(&self.region.at(n)),
        }
    }

    /// Orders the whole region ascending by key.
    pub fn sort(&mut self) {
        sort_algorithm::sort(self);
    }

    pub fn is_sorted(&self) -> bool {
        sort_algorithm::is_sorted(self)
    }

    pub fn into_region(self) -> Region<'a> {
        self.region
    }

    fn smear(&mut self, j: usize) {
        let next = j + 1;
        if next >= self.region.size() {
            return;
        }
        let pixel = self.region.at(j);
        self.region.set(next, pixel);
        if let KeyCache::Cached(keys) = &mut self.cache {
            keys[next] = keys[j];
        }
    }
}

impl<M: ColorMetric> Sortable for RegionSorter<'_, M> {
    fn len(&self) -> usize {
        self.region.size()
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self.key(i) < self.key(j)
    }

    fn exchange(&mut self, i: usize, j: usize) {
        self.region.exchange(i, j);
        if let KeyCache::Cached(keys) = &mut self.cache {
            keys.swap(i, j);
        }
        if self.policy == ExchangePolicy::Smear {
            self.smear(j);
        }
    }
}
