use ndarray::{Array1, Array2, Axis};

use crate::error::ViirsError;

/// `num` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            values[num - 1] = stop;
            values
        }
    }
}

/// Mean over the scan-line axis (axis 0).
pub fn collapse_scan_lines(values: &Array2<f64>, axis: &str) -> Result<Array1<f64>, ViirsError> {
    values
        .mean_axis(Axis(0))
        .ok_or_else(|| ViirsError::EmptyAxis(axis.to_string()))
}

/// Stretches or shrinks `values` to `len` points by linear interpolation over
/// the original index range, not over coordinates. First and last samples are
/// preserved.
pub fn resample_linear(values: &[f64], len: usize, axis: &str) -> Result<Vec<f64>, ViirsError> {
    if values.is_empty() {
        return Err(ViirsError::EmptyAxis(axis.to_string()));
    }
    let last = values.len() - 1;
    let resampled = linspace(0.0, last as f64, len)
        .into_iter()
        .map(|position| {
            let lower = (position.floor() as usize).min(last);
            if lower == last {
                return values[last];
            }
            let fraction = position - lower as f64;
            values[lower] + fraction * (values[lower + 1] - values[lower])
        })
        .collect();
    Ok(resampled)
}

/// Replaces the axis with `len` evenly spaced values between its minimum and
/// maximum. Original samples are discarded.
pub fn regenerate_axis(values: &[f64], len: usize, axis: &str) -> Result<Vec<f64>, ViirsError> {
    if values.is_empty() {
        return Err(ViirsError::EmptyAxis(axis.to_string()));
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(linspace(min, max, len))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use ndarray::array;

    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn linspace_hits_both_ends() {
        assert!(close(&linspace(0.0, 1.0, 5), &[0.0, 0.25, 0.5, 0.75, 1.0]));
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(3.0, 9.0, 0).is_empty());
    }

    #[test]
    fn upsample_keeps_endpoints() {
        let out = resample_linear(&[42.3, 42.6, 43.2], 5, "latitude").unwrap();
        assert!(close(&out, &[42.3, 42.45, 42.6, 42.9, 43.2]));
    }

    #[test]
    fn downsample_keeps_endpoints() {
        let out = resample_linear(&[0.0, 1.0, 2.0, 3.0, 4.0], 3, "longitude").unwrap();
        assert!(close(&out, &[0.0, 2.0, 4.0]));
    }

    #[test]
    fn single_sample_is_repeated() {
        let out = resample_linear(&[7.5], 3, "latitude").unwrap();
        assert_eq!(out, vec![7.5, 7.5, 7.5]);
    }

    #[test]
    fn empty_axis_is_rejected() {
        let err = resample_linear(&[], 3, "latitude").unwrap_err();
        assert_matches!(err, ViirsError::EmptyAxis(axis) if axis == "latitude");
        let err = regenerate_axis(&[], 3, "time").unwrap_err();
        assert_matches!(err, ViirsError::EmptyAxis(_));
    }

    #[test]
    fn regenerate_spans_min_to_max() {
        let out = regenerate_axis(&[30.0, 10.0, 20.0], 5, "time").unwrap();
        assert!(close(&out, &[10.0, 15.0, 20.0, 25.0, 30.0]));
    }

    #[test]
    fn collapse_averages_rows() {
        let grid = array![[1.0, 2.0, 3.0], [3.0, 4.0, 5.0]];
        let out = collapse_scan_lines(&grid, "latitude").unwrap();
        assert!(close(out.as_slice().unwrap(), &[2.0, 3.0, 4.0]));
    }
}
