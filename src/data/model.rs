use std::path::{Path, PathBuf};

use crate::error::{IdentifyError, Result};

// ---------------------------------------------------------------------------
// Spectrum – one measurement
// ---------------------------------------------------------------------------

/// A single named measurement with parallel wavenumber / intensity axes.
///
/// The two axes always have the same length; [`Spectrum::new`] refuses to
/// build anything else, so an inconsistent spectrum can never reach the
/// library or the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    name: String,
    source: Option<PathBuf>,
    /// Wavenumber axis (x), cm⁻¹, increasing.
    wavenumbers: Vec<f64>,
    /// Intensity axis (y) – same length as `wavenumbers`.
    intensities: Vec<f64>,
}

impl Spectrum {
    pub fn new(
        name: impl Into<String>,
        wavenumbers: Vec<f64>,
        intensities: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if wavenumbers.len() != intensities.len() {
            return Err(IdentifyError::InvalidSpectrum {
                name,
                wavenumbers: wavenumbers.len(),
                intensities: intensities.len(),
            });
        }
        Ok(Self {
            name,
            source: None,
            wavenumbers,
            intensities,
        })
    }

    /// Record the file this spectrum was read from.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn wavenumbers(&self) -> &[f64] {
        &self.wavenumbers
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    /// Number of samples on each axis.
    pub fn pixel_count(&self) -> usize {
        self.wavenumbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavenumbers.is_empty()
    }

    /// Linearly interpolated intensity at `wavenumber`.
    ///
    /// Outside the measured range the nearest end value is returned. `None`
    /// only for an empty spectrum.
    pub fn intensity_at(&self, wavenumber: f64) -> Option<f64> {
        let (&first_x, &last_x) = (self.wavenumbers.first()?, self.wavenumbers.last()?);
        let (&first_y, &last_y) = (self.intensities.first()?, self.intensities.last()?);
        if wavenumber <= first_x {
            return Some(first_y);
        }
        if wavenumber >= last_x {
            return Some(last_y);
        }

        // first index whose wavenumber is beyond the target; never 0 here
        let upper = self.wavenumbers.partition_point(|&x| x <= wavenumber);
        let (x0, x1) = (self.wavenumbers[upper - 1], self.wavenumbers[upper]);
        let (y0, y1) = (self.intensities[upper - 1], self.intensities[upper]);
        Some(y0 + (y1 - y0) * (wavenumber - x0) / (x1 - x0))
    }
}

/// Display name derived from a path: `/path/to/foo.bar.csv` → `foo.bar`.
pub fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Spectrum {
        Spectrum::new("ramp", vec![100.0, 102.0, 104.0], vec![10.0, 30.0, 20.0]).unwrap()
    }

    #[test]
    fn mismatched_axes_are_rejected() {
        let err = Spectrum::new("bad", vec![1.0, 2.0], vec![1.0]).unwrap_err();
        match err {
            IdentifyError::InvalidSpectrum {
                name,
                wavenumbers,
                intensities,
            } => {
                assert_eq!(name, "bad");
                assert_eq!((wavenumbers, intensities), (2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_spectrum_is_structurally_valid() {
        let spectrum = Spectrum::new("empty", Vec::new(), Vec::new()).unwrap();
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.pixel_count(), 0);
        assert_eq!(spectrum.intensity_at(500.0), None);
    }

    #[test]
    fn interpolation_between_and_beyond_samples() {
        let spectrum = ramp();
        assert_eq!(spectrum.intensity_at(50.0), Some(10.0));
        assert_eq!(spectrum.intensity_at(200.0), Some(20.0));
        assert_eq!(spectrum.intensity_at(101.0), Some(20.0));
        assert_eq!(spectrum.intensity_at(102.0), Some(30.0));
        assert_eq!(spectrum.intensity_at(103.5), Some(22.5));
    }

    #[test]
    fn names_come_from_file_stems() {
        assert_eq!(name_from_path(Path::new("/lib/foo.bar.csv")), "foo.bar");
        assert_eq!(name_from_path(Path::new("acetone.csv")), "acetone");
        assert_eq!(name_from_path(Path::new("noext")), "noext");
    }
}
