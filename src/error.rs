use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a spectrum from being loaded or a library from
/// being built. Malformed rows never show up here; the reader drops them.
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("unable to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spectrum '{name}' has {wavenumbers} wavenumbers but {intensities} intensities")]
    InvalidSpectrum {
        name: String,
        wavenumbers: usize,
        intensities: usize,
    },

    #[error("no usable reference spectra found in {}", .0.display())]
    EmptyLibrary(PathBuf),

    #[error("invalid configuration in {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {}: {reason}", path.display())]
    InvalidSetting { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, IdentifyError>;
