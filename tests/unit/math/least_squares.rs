//! Tests for normal-equation accumulation, solving and R² scoring

#[cfg(test)]
mod tests {
    use biasplane::math::least_squares::{NormalEquations, r_squared};

    fn plane(dx: f64, dy: f64) -> f64 {
        0.75f64.mul_add(dx, (-1.5f64).mul_add(dy, 20.0))
    }

    // Tests exact plane data is recovered
    // Verified by dropping the back substitution of the middle term
    #[test]
    fn test_solve_recovers_plane() {
        let mut system = NormalEquations::new();
        for y in -2..=2 {
            for x in -3..=3 {
                let (dx, dy) = (f64::from(x), f64::from(y));
                system.add_sample([1.0, dx, dy], plane(dx, dy));
            }
        }

        let [c, gx, gy] = system.solve().unwrap();
        assert!((c - 20.0).abs() < 1e-10);
        assert!((gx - 0.75).abs() < 1e-10);
        assert!((gy + 1.5).abs() < 1e-10);
        assert_eq!(system.samples(), 35);
    }

    // Tests solver handles non-centred, correlated regressors
    // Verified by skipping elimination of the off-diagonal term
    #[test]
    fn test_solve_correlated_features() {
        let points = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (2.0, 1.0), (3.0, 3.0)];
        let mut system = NormalEquations::new();
        for &(x, y) in &points {
            system.add_sample([1.0, x, y], 2.0f64.mul_add(x, 3.0 * y) + 1.0);
        }

        let [c, gx, gy] = system.solve().unwrap();
        assert!((c - 1.0).abs() < 1e-9);
        assert!((gx - 2.0).abs() < 1e-9);
        assert!((gy - 3.0).abs() < 1e-9);
    }

    // Tests collinear samples are reported as rank deficient
    // Verified by removing the relative pivot check
    #[test]
    fn test_collinear_samples_rejected() {
        let mut system = NormalEquations::new();
        for i in 0..10 {
            let t = f64::from(i);
            system.add_sample([1.0, t, 2.0 * t], t);
        }
        assert!(system.solve().is_none());
    }

    // Tests a single row of pixels cannot determine the y slope
    // Verified by accepting zero pivots
    #[test]
    fn test_constant_feature_rejected() {
        let mut system = NormalEquations::new();
        for i in 0..5 {
            system.add_sample([1.0, f64::from(i), 0.0], 1.0);
        }
        assert!(system.solve().is_none());
    }

    // Tests an empty system has no solution
    // Verified by returning zeros for an empty system
    #[test]
    fn test_empty_system() {
        assert!(NormalEquations::new().solve().is_none());
    }

    // Tests perfect prediction scores one
    // Verified by returning the residual ratio instead of its complement
    #[test]
    fn test_r_squared_perfect() {
        let observed = [1.0, 2.0, 4.0, 8.0];
        assert!((r_squared(&observed, &observed) - 1.0).abs() < 1e-12);
    }

    // Tests predicting the mean scores zero and worse scores negative
    // Verified by clamping the result at zero
    #[test]
    fn test_r_squared_mean_and_worse() {
        let observed = [1.0, 2.0, 3.0];
        assert!(r_squared(&observed, &[2.0, 2.0, 2.0]).abs() < 1e-12);
        assert!(r_squared(&observed, &[3.0, 2.0, 1.0]) < 0.0);
    }

    // Tests constant targets follow the regression scoring convention
    // Verified by returning NaN for zero total variance
    #[test]
    fn test_r_squared_constant_target() {
        let observed = [5.0, 5.0, 5.0];
        assert!((r_squared(&observed, &[5.0, 5.0, 5.0]) - 1.0).abs() < f64::EPSILON);
        assert!(r_squared(&observed, &[5.0, 5.5, 5.0]).abs() < f64::EPSILON);
    }
}
