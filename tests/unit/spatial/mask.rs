//! Tests for region-of-interest masks and centroid computation

#[cfg(test)]
mod tests {
    use biasplane::CorrectionError;
    use biasplane::spatial::mask::Mask;
    use ndarray::array;

    // Tests centroid is the mean column and row of in-region pixels
    // Verified by swapping x and y accumulation
    #[test]
    fn test_centroid_of_rectangle() {
        let mask = Mask::from_fn(6, 8, |row, col| (1..=3).contains(&row) && (2..=6).contains(&col));

        let centroid = mask.centroid().unwrap();
        assert!((centroid.x - 4.0).abs() < 1e-12);
        assert!((centroid.y - 2.0).abs() < 1e-12);
    }

    // Tests centroid of an asymmetric region
    // Verified by dividing by grid size instead of region count
    #[test]
    fn test_centroid_of_l_shape() {
        let mut mask = Mask::empty(3, 3);
        mask.set(0, 0, true);
        mask.set(1, 0, true);
        mask.set(1, 1, true);

        let centroid = mask.centroid().unwrap();
        assert!((centroid.x - 1.0 / 3.0).abs() < 1e-12);
        assert!((centroid.y - 2.0 / 3.0).abs() < 1e-12);
    }

    // Tests empty mask is rejected rather than producing NaN
    // Verified by removing the zero-count check
    #[test]
    fn test_empty_mask_centroid_fails() {
        let mask = Mask::empty(4, 4);
        assert!(matches!(
            mask.centroid(),
            Err(CorrectionError::InvalidInput { .. })
        ));
    }

    // Tests thresholding treats any non-zero, non-NaN sample as in-region
    // Verified by thresholding at 0.5
    #[test]
    fn test_from_values_threshold() {
        let values = array![[0.0, 0.2, -1.0], [f64::NAN, 0.0, 255.0]];
        let mask = Mask::from_values(&values);

        assert!(!mask.contains(0, 0));
        assert!(mask.contains(0, 1));
        assert!(mask.contains(0, 2));
        assert!(!mask.contains(1, 0));
        assert!(!mask.contains(1, 1));
        assert!(mask.contains(1, 2));
        assert_eq!(mask.count(), 3);
    }

    // Tests region iteration yields row-major coordinates
    // Verified by swapping the index decomposition
    #[test]
    fn test_iter_region_order() {
        let mut mask = Mask::empty(2, 3);
        mask.set(1, 0, true);
        mask.set(0, 2, true);

        let pixels: Vec<_> = mask.iter_region().collect();
        assert_eq!(pixels, vec![(0, 2), (1, 0)]);
    }

    // Tests out-of-bounds access is ignored on write and false on read
    // Verified by removing the bounds check in set
    #[test]
    fn test_out_of_bounds_access() {
        let mut mask = Mask::empty(2, 2);
        mask.set(5, 5, true);
        mask.set(0, 2, true);

        assert_eq!(mask.count(), 0);
        assert!(!mask.contains(5, 5));
        assert!(!mask.contains(0, 2));
    }

    // Tests conversion back to numeric values
    // Verified by inverting the in-region value
    #[test]
    fn test_to_values_round_trip() {
        let mask = Mask::from_fn(3, 4, |row, col| row == col);
        let values = mask.to_values();

        assert_eq!(values.dim(), (3, 4));
        assert_eq!(values.sum(), 3.0);
        assert_eq!(Mask::from_values(&values), mask);
    }

    // Tests shape accessors and full mask coverage
    // Verified by swapping rows and cols in the constructor
    #[test]
    fn test_dimensions() {
        let mask = Mask::full(3, 5);

        assert_eq!(mask.dim(), (3, 5));
        assert_eq!(mask.rows(), 3);
        assert_eq!(mask.cols(), 5);
        assert_eq!(mask.len(), 15);
        assert_eq!(mask.count(), 15);
        assert!(!mask.is_empty());
        assert!(Mask::empty(0, 5).is_empty());
    }

    // Tests debug output summarizes instead of dumping bits
    // Verified by deriving Debug
    #[test]
    fn test_debug_summary() {
        let mask = Mask::full(2, 2);
        assert_eq!(format!("{mask:?}"), "Mask { 2x2, 4 in region }");
    }
}
