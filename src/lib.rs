//! Planar bias-field correction for single-slice medical images
//!
//! A linear intensity ramp is fitted by least squares over a region of
//! interest, evaluated as a bias map over the whole image, and divided out
//! so that the region's intensities become uniform.

#![forbid(unsafe_code)]

/// Region statistics and synthetic phantoms
pub mod analysis;
/// Gradient fitting, bias map generation and correction
pub mod correction;
/// Input/output operations, configuration and error handling
pub mod io;
/// Least squares and percentile utilities
pub mod math;
/// Region-of-interest masks and centroids
pub mod spatial;

pub use io::error::{CorrectionError, Result};
