//! Correction constants and runtime path configuration

use std::path::PathBuf;

// Fitting
/// Minimum in-region pixels for a well-posed planar fit (three unknowns)
pub const MIN_FIT_PIXELS: usize = 3;

// Relative to the matching diagonal entry of the normal matrix
/// Pivot threshold below which the normal equations are treated as singular
pub const RANK_TOLERANCE: f64 = 1e-10;

// Rendering
/// Lower percentile clipped by auto-contrast
pub const CONTRAST_LOW_PERCENTILE: f64 = 2.0;
/// Upper percentile clipped by auto-contrast
pub const CONTRAST_HIGH_PERCENTILE: f64 = 98.0;
/// Scale applied to the gradient vector when drawing its arrow
pub const GRADIENT_ARROW_SCALE: f64 = 50.0;
/// Half-length of the centroid marker arms in pixels
pub const MARKER_RADIUS: i64 = 7;
/// Gap between figure panels in pixels
pub const PANEL_GAP: u32 = 8;

// Conversion
/// Voxel spacing assumed when a DICOM file carries none
pub const DEFAULT_VOXEL_SPACING: [f64; 3] = [1.0, 1.0, 1.0];

// Synthetic phantom
/// Fixed seed for reproducible phantoms
pub const DEFAULT_SEED: u64 = 42;
/// Default phantom edge length in pixels
pub const DEFAULT_PHANTOM_SIZE: usize = 128;
/// Disc radius as a fraction of the phantom edge length
pub const PHANTOM_RADIUS_FRACTION: f64 = 0.4;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

// Output settings
/// Suffix added to normalized image filenames
pub const NORMALIZED_SUFFIX: &str = "_normalized";
/// Suffix added to bias map filenames
pub const BIAS_SUFFIX: &str = "_bias";
/// Suffix identifying the mask that belongs to an image
pub const MASK_SUFFIX: &str = "_mask";
/// Extension used for written volumes
pub const VOLUME_EXTENSION: &str = "nii.gz";

// Logging
/// Log specification used when none is given on the command line
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Environment variables consulted by [`PathSettings::from_env`]
/// Source DICOM file
pub const ENV_DICOM_PATH: &str = "BIASPLANE_DICOM_PATH";
/// Image used for fitting or inspection
pub const ENV_IMAGE_PATH: &str = "BIASPLANE_IMAGE_PATH";
/// Mask belonging to the image
pub const ENV_MASK_PATH: &str = "BIASPLANE_MASK_PATH";
/// Parameter file written by fitting and read by application
pub const ENV_PARAMS_PATH: &str = "BIASPLANE_PARAMS_PATH";
/// Directory receiving generated outputs
pub const ENV_OUTPUT_DIR: &str = "BIASPLANE_OUTPUT_DIR";

/// File locations shared by the workflow steps
///
/// Built once by the caller and handed to the command runner; command-line
/// arguments take precedence over any value stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSettings {
    /// Source DICOM file for conversion
    pub dicom: Option<PathBuf>,
    /// Image volume used for fitting or inspection
    pub image: Option<PathBuf>,
    /// Region-of-interest mask volume
    pub mask: Option<PathBuf>,
    /// Gradient parameter file
    pub params: Option<PathBuf>,
    /// Directory receiving generated outputs
    pub output_dir: Option<PathBuf>,
}

impl PathSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        Self {
            dicom: path(ENV_DICOM_PATH),
            image: path(ENV_IMAGE_PATH),
            mask: path(ENV_MASK_PATH),
            params: path(ENV_PARAMS_PATH),
            output_dir: path(ENV_OUTPUT_DIR),
        }
    }
}
