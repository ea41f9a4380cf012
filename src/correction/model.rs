//! Fitted planar shading model and fit outcome

use crate::correction::generator::{BiasMap, GradientMapGenerator};
use crate::io::error::Result;
use crate::spatial::mask::Centroid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First-order shading model anchored at a region centroid
///
/// Evaluates to `value_at_center + gradient_x·(col − center_x) +
/// gradient_y·(row − center_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientModel {
    /// Column coordinate of the model origin
    pub center_x: f64,
    /// Row coordinate of the model origin
    pub center_y: f64,
    /// Intensity change per column
    pub gradient_x: f64,
    /// Intensity change per row
    pub gradient_y: f64,
    /// Intensity at the model origin
    pub value_at_center: f64,
}

impl GradientModel {
    /// Model value at a pixel
    pub fn evaluate(&self, row: usize, col: usize) -> f64 {
        let dx = col as f64 - self.center_x;
        let dy = row as f64 - self.center_y;
        self.gradient_y
            .mul_add(dy, self.gradient_x.mul_add(dx, self.value_at_center))
    }

    /// Origin of the model as a centroid
    pub const fn center(&self) -> Centroid {
        Centroid {
            x: self.center_x,
            y: self.center_y,
        }
    }

    /// Same gradients and center value, anchored at another region's centroid
    #[must_use]
    pub const fn recentered(&self, center: Centroid) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            ..*self
        }
    }

    /// Length of the gradient vector
    pub fn gradient_magnitude(&self) -> f64 {
        self.gradient_x.hypot(self.gradient_y)
    }

    /// Direction of the gradient vector in degrees, measured from +x towards +y
    pub fn gradient_direction_degrees(&self) -> f64 {
        self.gradient_y.atan2(self.gradient_x).to_degrees()
    }

    /// Evaluate the model over a full grid of `(height, width)`
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn bias_map(&self, shape: (usize, usize)) -> Result<BiasMap> {
        GradientMapGenerator::generate(
            shape,
            self.center_x,
            self.center_y,
            self.gradient_x,
            self.gradient_y,
            self.value_at_center,
        )
    }
}

/// Result of fitting a model to a masked image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOutcome {
    /// Fitted model
    pub model: GradientModel,
    /// Coefficient of determination on the fitted pixels
    pub r_squared: f64,
    /// Number of in-region pixels used
    pub pixel_count: usize,
}

impl fmt::Display for FitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.model;
        writeln!(f, "Center point: ({:.2}, {:.2})", m.center_x, m.center_y)?;
        writeln!(f, "Masked pixels: {}", self.pixel_count)?;
        writeln!(f, "Value at center: {:.4}", m.value_at_center)?;
        writeln!(
            f,
            "Gradient vector: ({:.6}, {:.6})",
            m.gradient_x, m.gradient_y
        )?;
        writeln!(f, "Gradient magnitude: {:.6}", m.gradient_magnitude())?;
        writeln!(
            f,
            "Gradient direction (degrees): {:.2}",
            m.gradient_direction_degrees()
        )?;
        write!(f, "R² score: {:.6}", self.r_squared)
    }
}
