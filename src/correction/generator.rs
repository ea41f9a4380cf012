//! Bias map evaluation and multiplicative shading removal

use crate::io::error::{Result, invalid_input};
use crate::spatial::mask::Mask;
use log::warn;
use ndarray::{Array2, Zip};

/// Full-resolution evaluation of a planar shading model
pub type BiasMap = Array2<f64>;

/// Behavior of [`GradientMapGenerator::apply`] where the bias map is near zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ZeroBiasPolicy {
    /// Divide as-is; zero bias yields infinities or NaN
    #[default]
    Propagate,
    /// Output `0.0` wherever `|bias| <= epsilon`
    Zero {
        /// Largest bias magnitude treated as zero
        epsilon: f64,
    },
}

/// Evaluates planar models over grids and divides them out of images
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientMapGenerator {
    policy: ZeroBiasPolicy,
}

impl GradientMapGenerator {
    /// Create a generator with the given zero-bias handling
    pub const fn new(policy: ZeroBiasPolicy) -> Self {
        Self { policy }
    }

    /// Zero-bias handling used by [`apply`](Self::apply)
    pub const fn policy(&self) -> ZeroBiasPolicy {
        self.policy
    }

    /// Evaluate the planar model at every pixel of a `(height, width)` grid
    ///
    /// Rows follow the y term and columns the x term:
    /// `bias[row, col] = value_at_center + gradient_x·(col − center_x) +
    /// gradient_y·(row − center_y)`.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn generate(
        shape: (usize, usize),
        center_x: f64,
        center_y: f64,
        gradient_x: f64,
        gradient_y: f64,
        value_at_center: f64,
    ) -> Result<BiasMap> {
        let (height, width) = shape;
        if height == 0 || width == 0 {
            return Err(invalid_input(&format!(
                "bias map dimensions must be positive, got {height}x{width}"
            )));
        }

        Ok(Array2::from_shape_fn(shape, |(row, col)| {
            let dx = col as f64 - center_x;
            let dy = row as f64 - center_y;
            gradient_y.mul_add(dy, gradient_x.mul_add(dx, value_at_center))
        }))
    }

    /// Divide `image` by `bias_map` inside `mask`, writing `0.0` elsewhere
    ///
    /// # Errors
    ///
    /// Returns an error if the three grids do not share one shape
    pub fn apply(&self, image: &Array2<f64>, bias_map: &BiasMap, mask: &Mask) -> Result<Array2<f64>> {
        if image.dim() != bias_map.dim() || image.dim() != mask.dim() {
            return Err(invalid_input(&format!(
                "shape mismatch: image {:?}, bias map {:?}, mask {:?}",
                image.dim(),
                bias_map.dim(),
                mask.dim()
            )));
        }

        let mut normalized = Array2::zeros(image.dim());
        Zip::indexed(&mut normalized)
            .and(image)
            .and(bias_map)
            .for_each(|(row, col), out, &value, &bias| {
                if !mask.contains(row, col) {
                    return;
                }
                *out = match self.policy {
                    ZeroBiasPolicy::Zero { epsilon } if bias.abs() <= epsilon => 0.0,
                    _ => value / bias,
                };
            });

        let non_finite = normalized.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            warn!("{non_finite} normalized pixels are not finite (bias map crosses zero inside the mask)");
        }

        Ok(normalized)
    }
}
