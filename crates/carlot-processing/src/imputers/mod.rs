//! Imputation module for handling missing values.
//!
//! Provides a k-nearest-neighbour imputer for numeric columns.

mod knn;

pub use knn::{ImputationReport, KnnImputer};
