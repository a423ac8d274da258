//! Raman spectrum identification.
//!
//! A sample spectrum is reduced to a handful of peak locations and compared
//! against the peaks of every compound in a reference [`Library`]. The best
//! scoring compound, if any, is reported together with a confidence score.

pub mod config;
pub mod data;
pub mod error;
pub mod identify;
pub mod stream;

pub use config::{Config, MatchDomain, PeakParams};
pub use data::model::Spectrum;
pub use error::{IdentifyError, Result};
pub use identify::library::{Identification, Library, PeakSet};
pub use identify::matcher::{Coordinate, Pixel, Wavenumber};
