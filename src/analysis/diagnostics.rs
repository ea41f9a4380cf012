//! Mask coverage statistics

use crate::spatial::mask::{Centroid, Mask};
use std::fmt;

/// Coverage summary of a region-of-interest mask
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskStatistics {
    /// Grid dimensions as `(rows, cols)`
    pub shape: (usize, usize),
    /// Number of in-region pixels
    pub pixel_count: usize,
    /// In-region pixels as a percentage of the grid
    pub coverage_percent: f64,
    /// Region centroid, absent for an empty mask
    pub centroid: Option<Centroid>,
}

impl MaskStatistics {
    /// Summarize a mask
    pub fn from_mask(mask: &Mask) -> Self {
        let pixel_count = mask.count();
        let coverage_percent = if mask.is_empty() {
            0.0
        } else {
            100.0 * pixel_count as f64 / mask.len() as f64
        };

        Self {
            shape: mask.dim(),
            pixel_count,
            coverage_percent,
            centroid: mask.centroid().ok(),
        }
    }
}

impl fmt::Display for MaskStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mask shape: {}x{}", self.shape.0, self.shape.1)?;
        write!(
            f,
            "Mask coverage: {} pixels ({:.2}%)",
            self.pixel_count, self.coverage_percent
        )?;
        if let Some(c) = self.centroid {
            write!(f, "\nMask center: ({:.2}, {:.2})", c.x, c.y)?;
        }
        Ok(())
    }
}
