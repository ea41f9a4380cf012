//! Mathematical utilities for model fitting and display scaling

/// Normal-equation least squares and goodness of fit
pub mod least_squares;
/// Percentiles and contrast stretching
pub mod percentile;
