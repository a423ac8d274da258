use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IdentifyError, Result};

// ---------------------------------------------------------------------------
// PeakParams – smoothing + peak detection settings
// ---------------------------------------------------------------------------

/// Settings used to turn a raw intensity trace into peak locations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakParams {
    /// Half-width of the boxcar window (window is `2h + 1` samples).
    pub boxcar_half_width: usize,
    /// Consecutive rising samples required on the left of a peak, and falling
    /// samples required on its right.
    pub min_ramp: usize,
    /// Minimum rise above the ramp base, in intensity counts.
    pub min_peak_height: f64,
}

impl PeakParams {
    /// Reference spectra are clean, so we ask for broad, tall peaks.
    pub const LIBRARY: PeakParams = PeakParams {
        boxcar_half_width: 10,
        min_ramp: 15,
        min_peak_height: 500.0,
    };

    /// Live measurements are noisier and weaker.
    pub const SAMPLE: PeakParams = PeakParams {
        boxcar_half_width: 5,
        min_ramp: 5,
        min_peak_height: 100.0,
    };
}

// ---------------------------------------------------------------------------
// MatchDomain – tolerance and score scale of one coordinate system
// ---------------------------------------------------------------------------

/// How far a sample peak may drift from a reference peak, and the score a
/// perfect match is worth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchDomain {
    pub max_offset: f64,
    pub max_score: f64,
}

impl MatchDomain {
    /// Peaks in cm⁻¹, scored as a percentage.
    pub const WAVENUMBER: MatchDomain = MatchDomain {
        max_offset: 10.0,
        max_score: 100.0,
    };

    /// Peaks as raw detector pixels, scored as a fraction.
    pub const PIXEL: MatchDomain = MatchDomain {
        max_offset: 20.0,
        max_score: 1.0,
    };

    /// Both the tolerance and the score scale must be positive and finite;
    /// a zero tolerance would divide by zero when scoring.
    pub fn is_valid(&self) -> bool {
        self.max_offset.is_finite()
            && self.max_offset > 0.0
            && self.max_score.is_finite()
            && self.max_score > 0.0
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Engine configuration. Every field has a default, so a JSON file only
/// needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: PeakParams,
    pub sample: PeakParams,
    pub wavenumber: MatchDomain,
    pub pixel: MatchDomain,
    /// Extension of reference files, compared case-insensitively.
    pub extension: String,
    /// Log per-compound and per-peak scoring details.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: PeakParams::LIBRARY,
            sample: PeakParams::SAMPLE,
            wavenumber: MatchDomain::WAVENUMBER,
            pixel: MatchDomain::PIXEL,
            extension: "csv".to_string(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file.
    ///
    /// Match domains with a non-positive tolerance or score scale are
    /// rejected with [`IdentifyError::InvalidSetting`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| IdentifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| IdentifyError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(reason) = config.problem() {
            return Err(IdentifyError::InvalidSetting {
                path: path.to_path_buf(),
                reason,
            });
        }
        Ok(config)
    }

    /// First setting that would make scoring meaningless, if any.
    pub fn problem(&self) -> Option<String> {
        [("wavenumber", &self.wavenumber), ("pixel", &self.pixel)]
            .into_iter()
            .find(|(_, domain)| !domain.is_valid())
            .map(|(name, domain)| {
                format!(
                    "{name}: max_offset ({}) and max_score ({}) must be positive",
                    domain.max_offset, domain.max_score
                )
            })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "wavenumber": { "max_offset": 4.0, "max_score": 1.0 } }"#)
                .unwrap();
        assert_eq!(config.wavenumber.max_offset, 4.0);
        assert_eq!(config.library, PeakParams::LIBRARY);
        assert_eq!(config.sample, PeakParams::SAMPLE);
        assert_eq!(config.extension, "csv");
        assert!(!config.verbose);
    }

    #[test]
    fn zero_or_negative_domains_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for (file, json) in [
            ("zero.json", r#"{ "wavenumber": { "max_offset": 0.0, "max_score": 100.0 } }"#),
            ("negative.json", r#"{ "pixel": { "max_offset": 20.0, "max_score": -1.0 } }"#),
        ] {
            let path = dir.path().join(file);
            std::fs::write(&path, json).unwrap();
            let err = Config::from_path(&path).unwrap_err();
            assert!(matches!(err, IdentifyError::InvalidSetting { .. }), "{file}: {err}");
        }

        let path = dir.path().join("fine.json");
        std::fs::write(&path, r#"{ "wavenumber": { "max_offset": 0.5, "max_score": 1.0 } }"#)
            .unwrap();
        assert_eq!(Config::from_path(&path).unwrap().wavenumber.max_offset, 0.5);
        assert_eq!(Config::default().problem(), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, IdentifyError::Io { .. }));
    }
}
