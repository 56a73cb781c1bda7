//! Utility functions for the sales_forecast crate

use crate::error::FitError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date layouts accepted in the `date` column, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a calendar date from the loosely formatted strings found in sales exports.
///
/// Timestamps are accepted and truncated to their date. Returns `None` when
/// nothing matches; callers drop such rows.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Apply d-order differencing
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo one level of differencing, starting from the last observed level.
pub fn integrate(differenced: &[f64], last_value: f64) -> Vec<f64> {
    let mut current = last_value;
    differenced
        .iter()
        .map(|&delta| {
            current += delta;
            current
        })
        .collect()
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, FitError> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(FitError::SingularSystem);
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = scale.max(1.0) * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .ok_or(FitError::SingularSystem)?;
        if a[pivot][col].abs() <= tolerance {
            return Err(FitError::SingularSystem);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(FitError::SingularSystem)
    }
}

/// Ordinary least squares without intercept via the normal equations.
///
/// Each entry of `design` is one observation's regressors.
pub fn least_squares(design: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>, FitError> {
    let k = match design.first() {
        Some(row) => row.len(),
        None => return Err(FitError::SingularSystem),
    };
    if design.len() != targets.len() || design.len() < k {
        return Err(FitError::SingularSystem);
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y) in design.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    solve_linear_system(xtx, xty)
}
