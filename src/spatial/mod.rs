//! Spatial data structures for regions of interest

/// Bit-packed region-of-interest mask and its centroid
pub mod mask;

pub use mask::{Centroid, Mask};
