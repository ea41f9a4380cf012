//! Bit-packed region-of-interest masks

use crate::io::error::{Result, invalid_input};
use bitvec::prelude::*;
use ndarray::Array2;
use std::fmt;

/// Mean pixel coordinate of a region of interest
///
/// `x` follows columns and `y` follows rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    /// Mean column index
    pub x: f64,
    /// Mean row index
    pub y: f64,
}

/// Binary region-of-interest grid
///
/// Stored row-major in a single bit vector, one bit per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    bits: BitVec,
    rows: usize,
    cols: usize,
}

impl Mask {
    /// Create a mask with no pixels in the region
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            bits: bitvec![0; rows * cols],
            rows,
            cols,
        }
    }

    /// Create a mask covering every pixel
    pub fn full(rows: usize, cols: usize) -> Self {
        Self {
            bits: bitvec![1; rows * cols],
            rows,
            cols,
        }
    }

    /// Build a mask by evaluating a predicate at every `(row, col)`
    pub fn from_fn<F>(rows: usize, cols: usize, mut predicate: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut mask = Self::empty(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                if predicate(row, col) {
                    mask.set(row, col, true);
                }
            }
        }
        mask
    }

    /// Threshold a numeric grid: any non-zero, non-NaN sample is in-region
    pub fn from_values(values: &Array2<f64>) -> Self {
        let (rows, cols) = values.dim();
        Self::from_fn(rows, cols, |row, col| {
            values
                .get((row, col))
                .is_some_and(|&v| v != 0.0 && !v.is_nan())
        })
    }

    /// Grid dimensions as `(rows, cols)`
    pub const fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of rows
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of pixels in the grid
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// True when the grid has no pixels at all
    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Test whether a pixel lies in the region; out-of-bounds is `false`
    pub fn contains(&self, row: usize, col: usize) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.bits.get(row * self.cols + col).as_deref() == Some(&true)
    }

    /// Include or exclude a pixel; out-of-bounds writes are ignored
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        if row < self.rows && col < self.cols {
            self.bits.set(row * self.cols + col, value);
        }
    }

    /// Number of in-region pixels
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Iterate in-region pixels as `(row, col)` in row-major order
    pub fn iter_region(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.bits
            .iter_ones()
            .map(move |index| (index / cols, index % cols))
    }

    /// Mean column and row index of in-region pixels
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`](crate::CorrectionError::InvalidInput) when the
    /// mask has no in-region pixels
    pub fn centroid(&self) -> Result<Centroid> {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0usize;

        for (row, col) in self.iter_region() {
            sum_x += col as f64;
            sum_y += row as f64;
            count += 1;
        }

        if count == 0 {
            return Err(invalid_input(&"mask contains no in-region pixels"));
        }

        let n = count as f64;
        Ok(Centroid {
            x: sum_x / n,
            y: sum_y / n,
        })
    }

    /// Convert to a numeric grid with `1.0` in-region and `0.0` elsewhere
    pub fn to_values(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.rows, self.cols), |(row, col)| {
            if self.contains(row, col) { 1.0 } else { 0.0 }
        })
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mask {{ {}x{}, {} in region }}",
            self.rows,
            self.cols,
            self.count()
        )
    }
}
