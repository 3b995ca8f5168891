//! Offset bands around `floor(sqrt(N))`, ordered by estimated prime density.

use num_bigint::{BigInt, BigUint};
use serde::Serialize;

use crate::density::density_in_range;
use crate::error::SearchError;

/// A half-open offset interval `[offset_start, offset_end)` from `floor(sqrt(N))`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    /// Priority after sorting, 0 = searched first.
    pub index: usize,
    pub offset_start: u64,
    pub offset_end: u64,
    pub density_estimate: f64,
}

impl Band {
    pub fn width(&self) -> u64 {
        self.offset_end - self.offset_start
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.offset_start <= offset && offset < self.offset_end
    }
}

/// Check a band layout request without building it.
pub fn validate_layout(delta_max: u64, num_bands: usize) -> Result<(), SearchError> {
    if num_bands == 0 {
        return Err(SearchError::ZeroBands);
    }
    if delta_max == 0 {
        return Err(SearchError::ZeroDeltaMax);
    }
    if num_bands as u64 > delta_max {
        return Err(SearchError::TooManyBands {
            num_bands,
            delta_max,
        });
    }
    Ok(())
}

/// Split `[0, delta_max)` into `num_bands` contiguous bands of width
/// `delta_max / num_bands`; the last band takes the remainder.
/// Bands come back in ascending offset order with zero density.
pub fn partition(delta_max: u64, num_bands: usize) -> Result<Vec<Band>, SearchError> {
    validate_layout(delta_max, num_bands)?;
    let width = delta_max / num_bands as u64;
    Ok((0..num_bands)
        .map(|i| {
            let offset_start = i as u64 * width;
            let offset_end = if i + 1 == num_bands {
                delta_max
            } else {
                offset_start + width
            };
            Band {
                index: i,
                offset_start,
                offset_end,
                density_estimate: 0.0,
            }
        })
        .collect())
}

/// Partition the offsets, score each band by the density around its
/// midpoint and order them densest first.
///
/// The sort is stable, so equal densities keep ascending offset order.
/// `index` is relabelled afterwards to the final priority.
pub fn prioritize(
    sqrt_n: &BigUint,
    delta_max: u64,
    num_bands: usize,
) -> Result<Vec<Band>, SearchError> {
    let mut bands = partition(delta_max, num_bands)?;
    let base = BigInt::from(sqrt_n.clone());

    for band in &mut bands {
        let midpoint = (band.offset_start + band.offset_end) / 2;
        let center = &base + midpoint;
        band.density_estimate = density_in_range(&center, band.width() / 2);
    }

    bands.sort_by(|a, b| b.density_estimate.total_cmp(&a.density_estimate));
    for (priority, band) in bands.iter_mut().enumerate() {
        band.index = priority;
    }

    Ok(bands)
}
