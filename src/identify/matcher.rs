use std::fmt::{Debug, Display};

use log::debug;

use crate::config::{Config, MatchDomain};
use crate::data::model::Spectrum;

/// Peak location in cm⁻¹.
pub type Wavenumber = f64;

/// Peak location as a raw detector pixel index.
pub type Pixel = usize;

// ---------------------------------------------------------------------------
// Coordinate – the axis peaks are compared on
// ---------------------------------------------------------------------------

/// A coordinate system that peak locations can be expressed and compared in.
///
/// Wavenumbers are robust to differences in pixel calibration between
/// instruments; pixels avoid touching the wavenumber axis at all.
pub trait Coordinate: Copy + PartialOrd + Debug + Display + Send + Sync + 'static {
    /// Absolute distance between two locations.
    fn distance(self, other: Self) -> f64;

    /// Translate detected pixel indices into this coordinate system.
    fn locate(spectrum: &Spectrum, pixels: &[usize]) -> Vec<Self>;

    /// The tolerance and score scale configured for this coordinate system.
    fn domain(config: &Config) -> MatchDomain;
}

impl Coordinate for Wavenumber {
    fn distance(self, other: Self) -> f64 {
        (self - other).abs()
    }

    fn locate(spectrum: &Spectrum, pixels: &[usize]) -> Vec<Self> {
        // smoothing keeps every sample in place, so indices line up
        pixels.iter().map(|&i| spectrum.wavenumbers()[i]).collect()
    }

    fn domain(config: &Config) -> MatchDomain {
        config.wavenumber
    }
}

impl Coordinate for Pixel {
    fn distance(self, other: Self) -> f64 {
        self.abs_diff(other) as f64
    }

    fn locate(_spectrum: &Spectrum, pixels: &[usize]) -> Vec<Self> {
        pixels.to_vec()
    }

    fn domain(config: &Config) -> MatchDomain {
        config.pixel
    }
}

// ---------------------------------------------------------------------------
// Fitness scoring
// ---------------------------------------------------------------------------

/// Score how well `sample` peaks cover the `reference` peaks of one compound.
///
/// Every reference peak is worth an equal share of `domain.max_score`. The
/// share shrinks linearly with the distance to the nearest sample peak and
/// reaches zero at `domain.max_offset`. A reference peak with no sample peak
/// within tolerance rejects the whole compound, as does a sample with fewer
/// peaks than the reference. A domain without a positive tolerance and
/// score scale never matches.
pub fn check_fit<C: Coordinate>(sample: &[C], reference: &[C], domain: &MatchDomain) -> f64 {
    check_fit_logged(sample, reference, domain, false)
}

pub(crate) fn check_fit_logged<C: Coordinate>(
    sample: &[C],
    reference: &[C],
    domain: &MatchDomain,
    verbose: bool,
) -> f64 {
    if !domain.is_valid() {
        if verbose {
            debug!("check_fit: unusable match domain {domain:?}");
        }
        return 0.0;
    }
    if reference.is_empty() {
        if verbose {
            debug!("check_fit: compound has no peaks");
        }
        return 0.0;
    }
    if sample.len() < reference.len() {
        if verbose {
            debug!(
                "check_fit: sample has too few peaks ({} < {})",
                sample.len(),
                reference.len()
            );
        }
        return 0.0;
    }

    let share = domain.max_score / reference.len() as f64;
    let mut total = 0.0;
    for (i, &peak) in reference.iter().enumerate() {
        // min_by keeps the first of equal minima
        let Some((nearest, distance)) = sample
            .iter()
            .map(|&s| (s, peak.distance(s)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            return 0.0;
        };

        if verbose {
            debug!("check_fit: reference peak #{i} ({peak}) nearest sample peak {nearest} (distance {distance:.2})");
        }
        if distance > domain.max_offset {
            if verbose {
                debug!(
                    "check_fit: reference peak #{i} unmatched ({distance:.2} > {:.2})",
                    domain.max_offset
                );
            }
            return 0.0;
        }

        total += share * (1.0 - distance / domain.max_offset);
    }

    if verbose {
        debug!("check_fit: total score {total:.2}");
    }
    total
}
