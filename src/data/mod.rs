/// Data layer: spectrum type, CSV reading/writing, and smoothing.
///
/// Architecture:
/// ```text
///   instrument export (.csv)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  line state machine → ParsedTable → Spectrum
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Spectrum: name, wavenumbers, intensities
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  boxcar smoothing ahead of peak detection
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
