//! Least-squares estimation of a planar shading model from a masked image

use crate::correction::model::{FitOutcome, GradientModel};
use crate::io::configuration::MIN_FIT_PIXELS;
use crate::io::error::{Result, invalid_input, numerical_error};
use crate::math::least_squares::{NormalEquations, r_squared};
use crate::spatial::mask::Mask;
use log::{debug, info};
use ndarray::Array2;

/// Fits `intensity ≈ value_at_center + gradient_x·dx + gradient_y·dy` over a mask
///
/// Offsets `dx`, `dy` are measured from the mask centroid, so the constant term
/// is the modelled intensity at the centroid.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientFitter;

impl GradientFitter {
    /// Create a fitter
    pub const fn new() -> Self {
        Self
    }

    /// Fit the planar model to the in-region pixels of `image`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `image` and `mask` differ in shape
    /// - `mask` has no in-region pixels
    /// - an in-region pixel is NaN or infinite
    /// - fewer than three pixels are selected, or they are collinear
    pub fn fit(&self, image: &Array2<f64>, mask: &Mask) -> Result<FitOutcome> {
        if image.dim() != mask.dim() {
            return Err(invalid_input(&format!(
                "image shape {:?} does not match mask shape {:?}",
                image.dim(),
                mask.dim()
            )));
        }

        let centroid = mask.centroid()?;
        let pixel_count = mask.count();
        debug!(
            "Fitting {pixel_count} pixels around ({:.2}, {:.2})",
            centroid.x, centroid.y
        );

        if pixel_count < MIN_FIT_PIXELS {
            return Err(numerical_error(
                "planar fit",
                &format!(
                    "{pixel_count} in-region pixels cannot determine {MIN_FIT_PIXELS} coefficients"
                ),
            ));
        }

        let mut offsets = Vec::with_capacity(pixel_count);
        let mut intensities = Vec::with_capacity(pixel_count);
        let mut system = NormalEquations::new();

        for (row, col) in mask.iter_region() {
            let dx = col as f64 - centroid.x;
            let dy = row as f64 - centroid.y;
            let intensity = image.get((row, col)).copied().unwrap_or(0.0);
            if !intensity.is_finite() {
                return Err(numerical_error(
                    "planar fit",
                    &format!("non-finite intensity {intensity} at pixel ({row}, {col})"),
                ));
            }
            system.add_sample([1.0, dx, dy], intensity);
            offsets.push((dx, dy));
            intensities.push(intensity);
        }

        let [value_at_center, gradient_x, gradient_y] = system.solve().ok_or_else(|| {
            numerical_error(
                "planar fit",
                &"design matrix is rank deficient (in-region pixels are collinear)",
            )
        })?;

        let predicted: Vec<f64> = offsets
            .iter()
            .map(|&(dx, dy)| gradient_y.mul_add(dy, gradient_x.mul_add(dx, value_at_center)))
            .collect();
        let score = r_squared(&intensities, &predicted);

        let model = GradientModel {
            center_x: centroid.x,
            center_y: centroid.y,
            gradient_x,
            gradient_y,
            value_at_center,
        };

        info!(
            "Fitted gradient ({gradient_x:.6}, {gradient_y:.6}), magnitude {:.6}, direction {:.2}°, R² {score:.6}",
            model.gradient_magnitude(),
            model.gradient_direction_degrees()
        );

        Ok(FitOutcome {
            model,
            r_squared: score,
            pixel_count: system.samples(),
        })
    }
}
