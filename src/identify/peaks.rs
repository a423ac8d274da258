use crate::config::PeakParams;
use crate::data::filter::boxcar;
use crate::data::model::Spectrum;

// ---------------------------------------------------------------------------
// Peak detection
// ---------------------------------------------------------------------------

/// Indices of the peaks in `trace`.
///
/// A peak is a sample reached by at least `min_ramp` consecutive rises, then
/// followed by `min_ramp` consecutive falls, and standing at least
/// `min_peak_height` above the ramp base.
///
/// The ramp base is always the first sample of the trace rather than the
/// foot of the current ramp. Peaks sitting on a raised baseline late in the
/// trace are therefore judged against the start of the measurement.
pub fn find_peaks(trace: &[f64], min_ramp: usize, min_peak_height: f64) -> Vec<usize> {
    let Some(&ramp_base) = trace.first() else {
        return Vec::new();
    };

    let mut peaks = Vec::new();
    let mut ramp = 0;
    for i in 1..trace.len().saturating_sub(min_ramp) {
        if trace[i] <= trace[i - 1] {
            ramp = 0;
            continue;
        }

        ramp += 1;
        if ramp < min_ramp {
            continue;
        }

        let falls_after = (i..i + min_ramp).all(|j| trace[j] > trace[j + 1]);
        if falls_after && trace[i] >= ramp_base + min_peak_height {
            peaks.push(i);
        }
    }
    peaks
}

/// Smooth the spectrum's intensities and return the pixel index of each peak.
pub fn detect_peaks(spectrum: &Spectrum, params: &PeakParams) -> Vec<usize> {
    let smoothed = boxcar(spectrum.intensities(), params.boxcar_half_width);
    find_peaks(&smoothed, params.min_ramp, params.min_peak_height)
}
