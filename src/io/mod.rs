//! File formats, command-line handling and ambient configuration
//!
//! This module contains:
//! - NIfTI, DICOM and JSON parameter persistence
//! - PNG figures for visual checks
//! - Command-line parsing, logging and progress display

/// Command-line interface and workflow runner
pub mod cli;
/// Constants and environment-driven path settings
pub mod configuration;
/// DICOM decoding and conversion to NIfTI
pub mod dicom;
/// Error types and context helpers
pub mod error;
/// Logger setup
pub mod logging;
/// NIfTI volume reading and writing
pub mod nifti;
/// Gradient parameter files
pub mod parameters;
/// Batch progress display
pub mod progress;
/// Figure rendering
pub mod visualization;
