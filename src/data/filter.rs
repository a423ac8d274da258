// ---------------------------------------------------------------------------
// Boxcar smoothing
// ---------------------------------------------------------------------------

/// Centered moving average with a window of `2 * half_width + 1` samples.
///
/// Samples closer than `half_width` to either end are copied through as-is,
/// so the output always has the same length as the input and peaks stay at
/// the same index.
pub fn boxcar(data: &[f64], half_width: usize) -> Vec<f64> {
    let mut smoothed = data.to_vec();
    let width = 2 * half_width + 1;
    for (start, window) in data.windows(width).enumerate() {
        smoothed[start + half_width] = window.iter().sum::<f64>() / width as f64;
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_trace_is_unchanged() {
        let data = vec![250.0; 40];
        assert_eq!(boxcar(&data, 5), data);
    }

    #[test]
    fn boundaries_pass_through() {
        let data: Vec<f64> = (0..12).map(|i| (i * i) as f64).collect();
        let smoothed = boxcar(&data, 3);
        assert_eq!(smoothed.len(), data.len());
        assert_eq!(&smoothed[..3], &data[..3]);
        assert_eq!(&smoothed[9..], &data[9..]);
        // interior: mean of 0, 1, 4, 9, 16, 25, 36
        assert!((smoothed[3] - 13.0).abs() < 1e-12);
    }

    #[test]
    fn zero_half_width_is_identity() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(boxcar(&data, 0), data);
    }

    #[test]
    fn short_traces_are_returned_unchanged() {
        let data = [1.0, 9.0, 2.0];
        assert_eq!(boxcar(&data, 2), data);
        assert!(boxcar(&[], 4).is_empty());
    }
}
