//! Density-based clustering (DBSCAN) over standardized coordinates.

use std::collections::VecDeque;

use crate::stats::{mean, population_std};

/// Neighbourhood radius in standardized units
pub const DBSCAN_EPS: f64 = 0.5;

/// Minimum neighbourhood size for a core point, the point itself included
pub const DBSCAN_MIN_POINTS: usize = 2;

/// Label of points that belong to no cluster
pub const NOISE: i32 = -1;

/// Scale each axis to zero mean and unit population variance.
///
/// An axis with zero variance is only centred.
pub fn standardize(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

    let axis = |values: &[f64]| {
        let center = mean(values).unwrap_or(0.0);
        let scale = population_std(values).filter(|s| *s > 0.0).unwrap_or(1.0);
        (center, scale)
    };
    let (x_center, x_scale) = axis(&xs);
    let (y_center, y_scale) = axis(&ys);

    points
        .iter()
        .map(|(x, y)| ((x - x_center) / x_scale, (y - y_center) / y_scale))
        .collect()
}

fn neighbours(points: &[(f64, f64)], index: usize, eps: f64) -> Vec<usize> {
    let (x, y) = points[index];
    points
        .iter()
        .enumerate()
        .filter(|(_, (px, py))| (px - x).hypot(py - y) <= eps)
        .map(|(i, _)| i)
        .collect()
}

/// Label every point with its cluster id (0, 1, ...) or [`NOISE`].
///
/// Cluster ids are assigned in order of the first core point reached.
pub fn dbscan(points: &[(f64, f64)], eps: f64, min_points: usize) -> Vec<i32> {
    let mut labels: Vec<Option<i32>> = vec![None; points.len()];
    let mut next_cluster = 0;

    for i in 0..points.len() {
        if labels[i].is_some() {
            continue;
        }

        let seeds = neighbours(points, i, eps);
        if seeds.len() < min_points {
            labels[i] = Some(NOISE);
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster);

        let mut queue: VecDeque<usize> = seeds.into_iter().filter(|&j| j != i).collect();
        while let Some(j) = queue.pop_front() {
            match labels[j] {
                // Border point previously marked as noise
                Some(NOISE) => labels[j] = Some(cluster),
                Some(_) => continue,
                None => {
                    labels[j] = Some(cluster);
                    let expansion = neighbours(points, j, eps);
                    if expansion.len() >= min_points {
                        queue.extend(
                            expansion
                                .into_iter()
                                .filter(|&k| matches!(labels[k], None | Some(NOISE))),
                        );
                    }
                }
            }
        }
    }

    labels.into_iter().map(|label| label.unwrap_or(NOISE)).collect()
}

/// Number of distinct non-noise labels
pub fn cluster_count(labels: &[i32]) -> usize {
    labels.iter().filter(|&&l| l != NOISE).max().map(|&max| max as usize + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_groups() {
        let points = vec![(0.0, 0.0), (0.1, 0.1), (0.0, 0.1), (10.0, 10.0), (10.1, 10.0), (10.0, 10.1)];
        let labels = dbscan(&standardize(&points), DBSCAN_EPS, DBSCAN_MIN_POINTS);
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(cluster_count(&labels), 2);
    }

    #[test]
    fn test_isolated_point_is_noise() {
        let points = vec![(0.0, 0.0), (0.1, 0.0), (5.0, 5.0)];
        let labels = dbscan(&points, DBSCAN_EPS, DBSCAN_MIN_POINTS);
        assert_eq!(labels, vec![0, 0, NOISE]);
        assert_eq!(cluster_count(&labels), 1);
    }

    #[test]
    fn test_noise_point_reached_later_becomes_border() {
        // The first point is visited before any core reaches it
        let points = vec![(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (3.0, 0.0)];
        let labels = dbscan(&points, 1.0, 3);
        assert_eq!(labels, vec![0, 0, 0, 0]);
        assert_eq!(cluster_count(&labels), 1);
    }

    #[test]
    fn test_noise_becomes_border() {
        // Point 0 alone is not core with min 3, but it is reachable from point 1
        let points = vec![(0.0, 0.0), (0.4, 0.0), (0.8, 0.0), (0.8, 0.1)];
        let labels = dbscan(&points, DBSCAN_EPS, 3);
        assert_eq!(labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_standardize_zero_variance_axis() {
        let scaled = standardize(&[(1.0, 5.0), (3.0, 5.0)]);
        assert_eq!(scaled, vec![(-1.0, 0.0), (1.0, 0.0)]);
    }
}
