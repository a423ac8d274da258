/// Identification layer: peak detection, fitness scoring, and the library.
///
/// ```text
///   Spectrum ──► peaks::detect_peaks ──► Coordinate::locate ──► peak locations
///                                                                  │
///   Library { name → PeakSet } ◄── reference spectra               │
///        │                                                         ▼
///        └──────────────► matcher::check_fit per compound ──► best Identification
/// ```

pub mod library;
pub mod matcher;
pub mod peaks;
