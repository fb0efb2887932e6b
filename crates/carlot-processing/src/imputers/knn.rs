use crate::error::{PipelineError, Result};
use crate::utils::{column_as_f64, is_numeric_dtype};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// What one imputation pass did to its target column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImputationReport {
    pub column: String,
    /// Missing values filled
    pub imputed: usize,
    /// Of those, filled with the column mean for lack of a comparable donor
    pub mean_fallbacks: usize,
    /// Missing values left in place because the column had no known value
    pub left_missing: usize,
}

pub struct KnnImputer {
    n_neighbors: usize,
}

impl KnnImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Fill the nulls of `target`, using `features` to find neighbours.
    ///
    /// A receiver takes the plain mean of the target values of its k
    /// nearest donors. Donors are rows where `target` is present; only
    /// donors sharing at least one non-null feature with the receiver
    /// (other than `target` itself) are comparable. A receiver with no
    /// comparable donor takes the mean of every known value. The target
    /// column is returned as `Float64`.
    pub fn fit_transform(
        &self,
        df: &DataFrame,
        target: &str,
        features: &[&str],
    ) -> Result<(DataFrame, ImputationReport)> {
        let target_col = df
            .column(target)
            .map_err(|_| PipelineError::ColumnNotFound(target.to_string()))?;
        if !is_numeric_dtype(target_col.dtype()) && target_col.dtype() != &DataType::Null {
            return Err(PipelineError::InvalidConfig(format!(
                "Cannot impute non-numeric column '{}' ({})",
                target,
                target_col.dtype()
            )));
        }

        let mut values = column_as_f64(df, target)?;
        let context = self.create_data_matrix(df, target, features)?;
        let mut report = ImputationReport {
            column: target.to_string(),
            ..Default::default()
        };

        let donors: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
        let receivers: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_none()).collect();

        if receivers.is_empty() {
            debug!("No missing values in '{}'", target);
        } else if donors.is_empty() {
            warn!(
                "Column '{}' has no known values; {} missing values left as is",
                target,
                receivers.len()
            );
            report.left_missing = receivers.len();
        } else {
            let column_mean =
                donors.iter().filter_map(|&i| values[i]).sum::<f64>() / donors.len() as f64;

            let mut filled = Vec::with_capacity(receivers.len());
            for &row in &receivers {
                match self.impute_value(&context, &values, &donors, row) {
                    Some(value) => filled.push((row, value)),
                    None => {
                        report.mean_fallbacks += 1;
                        filled.push((row, column_mean));
                    }
                }
            }
            // Donors are fixed before any receiver is filled.
            for (row, value) in filled {
                values[row] = Some(value);
            }
            report.imputed = receivers.len();
            info!(
                "Imputed {} missing values in '{}' (k={}, {} by column mean)",
                report.imputed, target, self.n_neighbors, report.mean_fallbacks
            );
        }

        let mut result_df = df.clone();
        result_df.replace(target, Series::new(target.into(), values))?;
        Ok((result_df, report))
    }

    /// Feature values per row, the target excluded.
    fn create_data_matrix(
        &self,
        df: &DataFrame,
        target: &str,
        features: &[&str],
    ) -> Result<Vec<Vec<Option<f64>>>> {
        let mut matrix = vec![Vec::new(); df.height()];

        for &name in features.iter().filter(|&&name| name != target) {
            let column = column_as_f64(df, name)
                .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))?;
            for (row, value) in matrix.iter_mut().zip(column) {
                row.push(value);
            }
        }

        Ok(matrix)
    }

    /// Mean target value of the k nearest comparable donors, if any.
    fn impute_value(
        &self,
        context: &[Vec<Option<f64>>],
        values: &[Option<f64>],
        donors: &[usize],
        receiver: usize,
    ) -> Option<f64> {
        let mut distances: Vec<(usize, f64)> = donors
            .iter()
            .map(|&donor| (donor, self.calculate_distance(&context[receiver], &context[donor])))
            .filter(|(_, distance)| distance.is_finite())
            .collect();

        if distances.is_empty() {
            return None;
        }

        // Stable sort keeps row order among equal distances.
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let k = self.n_neighbors.min(distances.len());
        let sum: f64 = distances[..k]
            .iter()
            .filter_map(|&(donor, _)| values[donor])
            .sum();
        Some(sum / k as f64)
    }

    /// Euclidean distance over the features both rows have, normalised by
    /// the number of such features.
    fn calculate_distance(&self, row1: &[Option<f64>], row2: &[Option<f64>]) -> f64 {
        let mut sum_squared_diff = 0.0;
        let mut count = 0;

        for (a, b) in row1.iter().zip(row2) {
            if let (Some(val1), Some(val2)) = (a, b) {
                let diff = val1 - val2;
                sum_squared_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            (sum_squared_diff / count as f64).sqrt()
        } else {
            f64::INFINITY // No common non-null features
        }
    }
}
