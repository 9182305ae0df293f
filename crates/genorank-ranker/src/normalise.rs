//! Standardisation and z-score helpers.

use ndarray::{Array2, ArrayView1, Axis};
use tracing::warn;

/// Below this a standard deviation is treated as zero.
pub const STD_EPSILON: f64 = 1e-12;

/// Column-wise zero mean, unit variance (population std).
/// Statistics come from every row of `data`; zero-variance columns are only
/// centred.
pub fn standardise(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows();
    if n == 0 {
        return data.clone();
    }
    let mut out = data.clone();
    let mut flat = 0usize;
    for mut col in out.axis_iter_mut(Axis(1)) {
        let (mean, std) = mean_std(col.view());
        let scale = if std < STD_EPSILON {
            flat += 1;
            1.0
        } else {
            std
        };
        col.mapv_inplace(|v| (v - mean) / scale);
    }
    if flat > 0 {
        warn!(columns = flat, "Zero-variance feature columns left unscaled");
    }
    out
}

/// Mean and population standard deviation. Empty input gives `(0, 0)`.
pub fn mean_std(values: ArrayView1<f64>) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.sum() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    (mean, var.sqrt())
}

/// `max(0, (x - mean) / std)`, or 0 when `std` is effectively zero.
pub fn clipped_z(x: f64, mean: f64, std: f64) -> f64 {
    if std < STD_EPSILON {
        return 0.0;
    }
    ((x - mean) / std).max(0.0)
}
