//! Error types and context management for shading correction operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all correction operations
#[derive(Debug)]
pub enum CorrectionError {
    /// Inputs violate a precondition of the requested operation
    ///
    /// Raised for shape mismatches, empty masks and zero-sized grids
    InvalidInput {
        /// Description of what's wrong with the input
        reason: String,
    },

    /// Numerical computation could not produce a well-posed result
    ///
    /// Occurs when the fitting region is too small or degenerate, e.g.:
    /// - Fewer than three in-region pixels
    /// - All in-region pixels lie on a single line
    Numerical {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// Stored data has a layout the operation cannot accept
    Format {
        /// Path of the offending file
        path: PathBuf,
        /// Explanation of the unexpected layout
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to decode a NIfTI file
    NiftiRead {
        /// Path to the NIfTI file
        path: PathBuf,
        /// Underlying NIfTI error
        source: nifti::NiftiError,
    },

    /// Failed to read or decode a DICOM file
    Dicom {
        /// Path to the DICOM file
        path: PathBuf,
        /// Stage of the conversion that failed
        operation: &'static str,
        /// Underlying DICOM error
        source: Box<dyn std::error::Error>,
    },

    /// Failed to serialize or parse the parameter file
    Parameters {
        /// Path to the parameter file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Failed to save a rendered figure to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Logger could not be started
    Logging {
        /// Underlying logger error
        source: Box<flexi_logger::FlexiLoggerError>,
    },
}

impl fmt::Display for CorrectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { reason } => {
                write!(f, "Invalid input: {reason}")
            }
            Self::Numerical { operation, reason } => {
                write!(f, "Numerical error in {operation}: {reason}")
            }
            Self::Format { path, reason } => {
                write!(f, "Unsupported layout in '{}': {reason}", path.display())
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::NiftiRead { path, source } => {
                write!(f, "Failed to read NIfTI '{}': {source}", path.display())
            }
            Self::Dicom {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "DICOM error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Parameters { path, source } => {
                write!(f, "Invalid parameter file '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Logging { source } => {
                write!(f, "Failed to start logger: {source}")
            }
        }
    }
}

impl std::error::Error for CorrectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NiftiRead { source, .. } => Some(source),
            Self::Dicom { source, .. } => Some(source.as_ref()),
            Self::Parameters { source, .. } => Some(source),
            Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Logging { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Convenience type alias for correction results
pub type Result<T> = std::result::Result<T, CorrectionError>;

/// Attaches the file being processed to I/O failures
pub trait WithPath<T> {
    /// Wrap an I/O error with the path and operation it concerns
    ///
    /// # Errors
    ///
    /// Propagates the original error as [`CorrectionError::FileSystem`]
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| CorrectionError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

impl From<flexi_logger::FlexiLoggerError> for CorrectionError {
    fn from(source: flexi_logger::FlexiLoggerError) -> Self {
        Self::Logging {
            source: Box::new(source),
        }
    }
}

/// Create an invalid input error
pub fn invalid_input(reason: &impl ToString) -> CorrectionError {
    CorrectionError::InvalidInput {
        reason: reason.to_string(),
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> CorrectionError {
    CorrectionError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a numerical error
pub fn numerical_error(operation: &'static str, reason: &impl ToString) -> CorrectionError {
    CorrectionError::Numerical {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a format error for the given file
pub fn format_error(path: &Path, reason: &impl ToString) -> CorrectionError {
    CorrectionError::Format {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
