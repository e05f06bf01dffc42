//! Moving-average smoothing and display scaling.
use crate::analysis::window::RingSeries;
use serde::{Deserialize, Serialize};

/// Mean of the last `window` elements of `buffer`.
///
/// The sum is always divided by `window`, so a buffer shorter than the window
/// behaves as if it were padded with zeros. A zero window yields 0.
pub fn moving_average(buffer: &[f64], window: usize) -> f64 {
    if window == 0 {
        return 0.0;
    }
    let start = buffer.len().saturating_sub(window);
    buffer[start..].iter().sum::<f64>() / window as f64
}

/// [`moving_average`] over a ring buffer, summing oldest to newest so the
/// result is bit-identical to the slice version.
pub(crate) fn trailing_mean(series: &RingSeries<f64>, window: usize) -> f64 {
    if window == 0 {
        return 0.0;
    }
    series.tail(window).sum::<f64>() / window as f64
}

/// Value range used to scale a chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Default for DisplayRange {
    fn default() -> Self {
        Self { min: -1.0, max: 1.0 }
    }
}

/// Display range of `buffer` with a 10% margin on each side.
///
/// NaN and infinite entries are ignored. With nothing left to measure the
/// range falls back to `[-1, 1]`.
pub fn display_range(buffer: &[f64]) -> DisplayRange {
    let mut finite = buffer.iter().copied().filter(|v| v.is_finite());
    let Some(first) = finite.next() else {
        return DisplayRange::default();
    };
    let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let margin = (max - min) * 0.1;
    DisplayRange {
        min: min - margin,
        max: max + margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_uses_trailing_window() {
        let data = [10.0, 1.0, 2.0, 3.0];
        assert_eq!(moving_average(&data, 3), 2.0);
        assert_eq!(moving_average(&data, 1), 3.0);
        assert_eq!(moving_average(&data, 4), 4.0);
    }

    #[test]
    fn moving_average_divides_by_window() {
        assert_eq!(moving_average(&[3.0, 3.0], 4), 1.5);
        assert_eq!(moving_average(&[], 4), 0.0);
        assert_eq!(moving_average(&[1.0], 0), 0.0);
    }

    #[test]
    fn ring_and_slice_means_agree() {
        let mut ring = RingSeries::filled(7, 0.0);
        let mut plain = vec![0.0; 7];
        for i in 0..40 {
            let v = (i as f64 * 0.37).sin() * 0.1 + 0.013 * i as f64;
            ring.push(v);
            plain.remove(0);
            plain.push(v);
            assert_eq!(trailing_mean(&ring, 5), moving_average(&plain, 5));
        }
    }

    #[test]
    fn empty_or_nan_range_defaults() {
        assert_eq!(display_range(&[]), DisplayRange { min: -1.0, max: 1.0 });
        assert_eq!(
            display_range(&[f64::NAN, f64::NAN]),
            DisplayRange { min: -1.0, max: 1.0 }
        );
    }

    #[test]
    fn range_adds_ten_percent_margin() {
        let range = display_range(&[0.0, f64::NAN, 10.0, 5.0]);
        assert!((range.min - -1.0).abs() < 1e-12);
        assert!((range.max - 11.0).abs() < 1e-12);
    }

    #[test]
    fn constant_buffer_has_zero_width_range() {
        let range = display_range(&[0.5; 4]);
        assert_eq!(range, DisplayRange { min: 0.5, max: 0.5 });
    }
}
