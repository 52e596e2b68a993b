//! Numeric kernels shared by the analyzers.
//!
//! Variances and standard deviations are population statistics (divide by
//! `n`). Percentiles use linear interpolation between closest ranks.

use oceanlens_core::error::{OceanError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// p-value below which a result is reported as significant
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64)
}

pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Copy of `values` in ascending order
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile `p` (0-100) of ascending `sorted` values
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        len => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
        }
    }
}

/// Count, mean, standard deviation and bounds of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

pub fn describe(values: &[f64]) -> Option<Describe> {
    let mean = mean(values)?;
    let std = population_std(values)?;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    Some(Describe { mean, std, min, max, count: values.len() })
}

/// Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrFences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    pub fn compute(values: &[f64], multiplier: f64) -> Option<Self> {
        let sorted = sorted(values);
        let q1 = percentile(&sorted, 25.0)?;
        let q3 = percentile(&sorted, 75.0)?;
        let iqr = q3 - q1;
        Some(Self { q1, q3, iqr, lower: q1 - multiplier * iqr, upper: q3 + multiplier * iqr })
    }

    /// Whether `value` lies within the fences, bounds included
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Signed z-scores of `values`, `None` when the spread is zero
pub fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let mean = mean(values)?;
    let std = population_std(values)?;
    if std <= 0.0 || !std.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std).collect())
}

/// Indices and z-scores of values at or beyond `threshold` standard deviations
pub fn z_score_outliers(values: &[f64], threshold: f64) -> Vec<(usize, f64)> {
    z_scores(values)
        .map(|scores| {
            scores
                .into_iter()
                .enumerate()
                .filter(|(_, z)| z.abs() >= threshold)
                .collect()
        })
        .unwrap_or_default()
}

/// Two-sided p-value of a t statistic
fn two_sided_p_value(t: f64, degrees_of_freedom: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, degrees_of_freedom) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// p-value for a correlation coefficient over `n` samples
fn correlation_p_value(r: f64, n: usize) -> f64 {
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    two_sided_p_value(r * (df / denom).sqrt(), df)
}

struct Moments {
    x_mean: f64,
    y_mean: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(x: &[f64], y: &[f64], analysis: &str) -> Result<Moments> {
    if x.len() != y.len() {
        return Err(OceanError::InvalidInput {
            reason: format!("{}: series lengths differ ({} vs {})", analysis, x.len(), y.len()),
        });
    }
    if x.len() < 3 {
        return Err(OceanError::insufficient(analysis, 3, x.len()));
    }

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    Ok(Moments { x_mean, y_mean, sxx, syy, sxy })
}

/// Pearson correlation with its two-sided p-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub correlation: f64,
    pub p_value: f64,
    pub significant: bool,
    pub sample_size: usize,
}

pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation> {
    let m = moments(x, y, "correlation")?;
    if m.sxx <= 0.0 || m.syy <= 0.0 {
        return Err(OceanError::InvalidInput {
            reason: "correlation is undefined for a constant series".to_string(),
        });
    }

    let r = (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = correlation_p_value(r, x.len());
    Ok(Correlation {
        correlation: r,
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
        sample_size: x.len(),
    })
}

/// Ordinary least-squares fit of `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
}

pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<Regression> {
    let m = moments(x, y, "regression")?;
    if m.sxx <= 0.0 {
        return Err(OceanError::InvalidInput {
            reason: "regression needs at least two distinct x values".to_string(),
        });
    }

    let slope = m.sxy / m.sxx;
    let intercept = m.y_mean - slope * m.x_mean;
    let r = if m.syy > 0.0 {
        (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let r_squared = r * r;
    let df = (x.len() - 2) as f64;
    let std_err = ((1.0 - r_squared).max(0.0) * m.syy / m.sxx / df).sqrt();

    Ok(Regression {
        slope,
        intercept,
        r_squared,
        p_value: correlation_p_value(r, x.len()),
        std_err,
    })
}
