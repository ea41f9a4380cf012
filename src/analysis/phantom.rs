//! Synthetic shaded phantoms

use crate::correction::model::GradientModel;
use crate::io::configuration::PHANTOM_RADIUS_FRACTION;
use crate::io::error::{Result, invalid_parameter};
use crate::spatial::mask::Mask;
use ndarray::Array2;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Synthetic single-slice acquisition with known shading
pub struct Phantom {
    /// Shaded intensities, zero outside the disc
    pub image: Array2<f64>,
    /// Disc region
    pub mask: Mask,
    /// Shading applied inside the disc, anchored at the disc center
    pub shading: GradientModel,
}

/// Parameters of a disc phantom
#[derive(Debug, Clone, Copy)]
pub struct PhantomSpec {
    /// Edge length of the square grid
    pub size: usize,
    /// Intensity change per column
    pub gradient_x: f64,
    /// Intensity change per row
    pub gradient_y: f64,
    /// Intensity at the disc center
    pub value_at_center: f64,
    /// Relative standard deviation of multiplicative noise
    pub noise: f64,
    /// Random seed
    pub seed: u64,
}

impl PhantomSpec {
    /// Render the phantom
    ///
    /// A disc of radius `0.4·size` centred in the grid carries the planar
    /// shading, multiplied by `1 + noise·N(0, 1)` per pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is below 3 or `noise` is negative or not finite
    pub fn generate(&self) -> Result<Phantom> {
        if self.size < 3 {
            return Err(invalid_parameter(
                "size",
                &self.size,
                &"phantom needs at least 3x3 pixels",
            ));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(invalid_parameter(
                "noise",
                &self.noise,
                &"must be a finite non-negative fraction",
            ));
        }

        let center = (self.size as f64 - 1.0) / 2.0;
        let radius = PHANTOM_RADIUS_FRACTION * self.size as f64;
        let mask = Mask::from_fn(self.size, self.size, |row, col| {
            (col as f64 - center).hypot(row as f64 - center) <= radius
        });

        let shading = GradientModel {
            center_x: center,
            center_y: center,
            gradient_x: self.gradient_x,
            gradient_y: self.gradient_y,
            value_at_center: self.value_at_center,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut image = Array2::zeros((self.size, self.size));
        for ((row, col), value) in image.indexed_iter_mut() {
            if mask.contains(row, col) {
                let factor = self.noise.mul_add(standard_normal(&mut rng), 1.0);
                *value = shading.evaluate(row, col) * factor;
            }
        }

        Ok(Phantom {
            image,
            mask,
            shading,
        })
    }
}

// Box-Muller transform
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
