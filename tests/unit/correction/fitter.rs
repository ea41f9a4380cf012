//! Tests for least-squares fitting of the planar shading model

#[cfg(test)]
mod tests {
    use biasplane::CorrectionError;
    use biasplane::correction::fitter::GradientFitter;
    use biasplane::correction::generator::GradientMapGenerator;
    use biasplane::spatial::mask::Mask;
    use ndarray::Array2;

    fn disc(rows: usize, cols: usize) -> Mask {
        let (cy, cx) = (rows as f64 / 2.0, cols as f64 / 2.0);
        let radius = rows.min(cols) as f64 / 3.0;
        Mask::from_fn(rows, cols, |row, col| {
            (col as f64 - cx).hypot(row as f64 - cy) <= radius
        })
    }

    // Deterministic, non-planar texture
    fn textured(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(row, col)| {
            let (y, x) = (row as f64, col as f64);
            0.5f64.mul_add(x, 50.0) - 0.3 * y + (x * 0.7).sin() * 4.0 + (y * 1.3).cos() * 3.0
        })
    }

    // Independent OLS with design columns (1, x, y) in absolute coordinates,
    // solved by Cramer's rule
    fn reference_plane(image: &Array2<f64>, mask: &Mask) -> [f64; 3] {
        let mut m = [[0.0f64; 3]; 3];
        let mut v = [0.0f64; 3];
        for (row, col) in mask.iter_region() {
            let f = [1.0, col as f64, row as f64];
            let z = image[(row, col)];
            for i in 0..3 {
                for j in 0..3 {
                    m[i][j] += f[i] * f[j];
                }
                v[i] += f[i] * z;
            }
        }
        let det = |a: [[f64; 3]; 3]| {
            a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
                - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
                + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
        };
        let d = det(m);
        let mut out = [0.0; 3];
        for k in 0..3 {
            let mut replaced = m;
            for i in 0..3 {
                replaced[i][k] = v[i];
            }
            out[k] = det(replaced) / d;
        }
        out
    }

    // Tests fitted model reproduces an independent OLS solution at in-region pixels
    // Verified by measuring offsets from the grid center instead of the centroid
    #[test]
    fn test_fit_matches_independent_ols() {
        let image = textured(24, 30);
        let mask = disc(24, 30);

        let outcome = GradientFitter::new().fit(&image, &mask).unwrap();
        let m = outcome.model;
        let bias = GradientMapGenerator::generate(
            image.dim(),
            m.center_x,
            m.center_y,
            m.gradient_x,
            m.gradient_y,
            m.value_at_center,
        )
        .unwrap();

        let [c, gx, gy] = reference_plane(&image, &mask);
        assert!((m.gradient_x - gx).abs() < 1e-8);
        assert!((m.gradient_y - gy).abs() < 1e-8);
        for (row, col) in mask.iter_region() {
            let expected = gy.mul_add(row as f64, gx.mul_add(col as f64, c));
            assert!(
                (bias[(row, col)] - expected).abs() < 1e-8,
                "mismatch at ({row}, {col})"
            );
        }
        assert_eq!(outcome.pixel_count, mask.count());
        assert!(outcome.r_squared > 0.0 && outcome.r_squared < 1.0);
    }

    // Tests noiseless planar fields fit perfectly
    // Verified by computing R² against the raw intensities' mean of the full image
    #[test]
    fn test_perfect_plane_scores_one() {
        let mask = disc(32, 32);
        let centroid = mask.centroid().unwrap();
        let image =
            GradientMapGenerator::generate((32, 32), centroid.x, centroid.y, 0.8, -0.4, 120.0)
                .unwrap();

        let outcome = GradientFitter::new().fit(&image, &mask).unwrap();
        assert!((outcome.r_squared - 1.0).abs() < 1e-9);
        assert!((outcome.model.gradient_x - 0.8).abs() < 1e-9);
        assert!((outcome.model.gradient_y + 0.4).abs() < 1e-9);
        assert!((outcome.model.value_at_center - 120.0).abs() < 1e-9);
    }

    // Tests the model center is the mask centroid
    // Verified by anchoring at the image center
    #[test]
    fn test_center_is_centroid() {
        let mask = Mask::from_fn(10, 10, |row, col| row < 4 && col >= 5);
        let image = Array2::from_elem((10, 10), 3.0);

        let outcome = GradientFitter::new().fit(&image, &mask).unwrap();
        assert!((outcome.model.center_x - 7.0).abs() < 1e-12);
        assert!((outcome.model.center_y - 1.5).abs() < 1e-12);
        assert!((outcome.model.value_at_center - 3.0).abs() < 1e-12);
        assert!(outcome.model.gradient_x.abs() < 1e-12);
        assert!(outcome.model.gradient_y.abs() < 1e-12);
    }

    // Tests pixels outside the mask do not influence the fit
    // Verified by iterating every pixel
    #[test]
    fn test_outside_pixels_ignored() {
        let mask = Mask::from_fn(8, 8, |row, col| (2..6).contains(&row) && (2..6).contains(&col));
        let mut image = Array2::from_shape_fn((8, 8), |(row, col)| (row + col) as f64);
        let baseline = GradientFitter::new().fit(&image, &mask).unwrap();

        image[(0, 0)] = 1.0e9;
        image[(7, 7)] = f64::NAN;
        let perturbed = GradientFitter::new().fit(&image, &mask).unwrap();

        assert_eq!(baseline, perturbed);
    }

    // Tests two in-region pixels are rejected as rank deficient
    // Verified by lowering the minimum pixel count
    #[test]
    fn test_two_pixels_fail_numerically() {
        let mut mask = Mask::empty(4, 4);
        mask.set(0, 0, true);
        mask.set(3, 3, true);
        let image = Array2::from_elem((4, 4), 1.0);

        let result = GradientFitter::new().fit(&image, &mask);
        assert!(matches!(result, Err(CorrectionError::Numerical { .. })));
    }

    // Tests collinear regions cannot determine both gradients
    // Verified by removing the rank check
    #[test]
    fn test_collinear_region_fails_numerically() {
        let mask = Mask::from_fn(6, 6, |row, col| row == col);
        let image = Array2::from_shape_fn((6, 6), |(row, _)| row as f64);

        let result = GradientFitter::new().fit(&image, &mask);
        assert!(matches!(result, Err(CorrectionError::Numerical { .. })));
    }

    // Tests a NaN inside the region is named as the cause, not collinearity
    // Verified by letting the NaN reach the solver
    #[test]
    fn test_non_finite_intensity_reported() {
        let mut image = textured(12, 12);
        image[(6, 5)] = f64::NAN;

        let result = GradientFitter::new().fit(&image, &disc(12, 12));
        let Err(CorrectionError::Numerical { reason, .. }) = result else {
            panic!("expected a numerical error, got {result:?}");
        };
        assert!(reason.contains("non-finite"), "{reason}");
        assert!(reason.contains("(6, 5)"), "{reason}");
    }

    // Tests non-finite values outside the region do not disturb the fit
    // Verified by scanning the whole image for non-finite values
    #[test]
    fn test_non_finite_outside_region_ignored() {
        let mut image = textured(12, 12);
        image[(0, 0)] = f64::INFINITY;

        let outcome = GradientFitter::new().fit(&image, &disc(12, 12)).unwrap();
        assert!(outcome.model.gradient_x.is_finite());
        assert_eq!(outcome.pixel_count, disc(12, 12).count());
    }

    // Tests mismatched shapes are rejected before any computation
    // Verified by checking only the row count
    #[test]
    fn test_shape_mismatch_is_invalid_input() {
        let image = Array2::zeros((4, 5));
        let mask = Mask::full(5, 4);

        let result = GradientFitter::new().fit(&image, &mask);
        assert!(matches!(result, Err(CorrectionError::InvalidInput { .. })));
    }

    // Tests an empty mask is invalid input
    // Verified by reporting it as a numerical error
    #[test]
    fn test_empty_mask_is_invalid_input() {
        let image = Array2::zeros((4, 4));
        let result = GradientFitter::new().fit(&image, &Mask::empty(4, 4));
        assert!(matches!(result, Err(CorrectionError::InvalidInput { .. })));
    }
}
