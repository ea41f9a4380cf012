//! DICOM to NIfTI conversion for viewing and masking in external tools

use crate::io::configuration::DEFAULT_VOXEL_SPACING;
use crate::io::error::{CorrectionError, Result, format_error};
use crate::io::nifti::save_volume;
use dicom::dictionary_std::tags;
use dicom::object::{InMemDicomObject, open_file};
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use log::{info, warn};
use ndarray::Array3;
use std::path::Path;

/// Summary of a completed conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Written volume shape as `(rows, cols, slices)`
    pub shape: (usize, usize, usize),
    /// Voxel spacing written into the affine
    pub spacing: [f64; 3],
    /// Whether the spacing came from the file rather than the default
    pub spacing_from_header: bool,
}

/// Parse a `PixelSpacing` value (`row\col`, in mm)
pub fn parse_pixel_spacing(value: &str) -> Option<[f64; 2]> {
    let parts: Vec<f64> = value
        .split('\\')
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect();
    match parts.as_slice() {
        [row, col, ..] if *row > 0.0 && *col > 0.0 => Some([*row, *col]),
        _ => None,
    }
}

/// Combine in-plane spacing and slice thickness, falling back to the default
///
/// Both must be present for the header spacing to be used.
pub const fn resolve_spacing(
    pixel_spacing: Option<[f64; 2]>,
    slice_thickness: Option<f64>,
) -> Option<[f64; 3]> {
    match (pixel_spacing, slice_thickness) {
        (Some([row, col]), Some(thickness)) if thickness > 0.0 => Some([row, col, thickness]),
        _ => None,
    }
}

fn header_spacing(object: &InMemDicomObject) -> Option<[f64; 3]> {
    let pixel_spacing = object
        .element(tags::PIXEL_SPACING)
        .ok()
        .and_then(|e| e.to_str().ok())
        .and_then(|s| parse_pixel_spacing(&s));
    let slice_thickness = object
        .element(tags::SLICE_THICKNESS)
        .ok()
        .and_then(|e| e.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok());
    resolve_spacing(pixel_spacing, slice_thickness)
}

fn dicom_error<E>(path: &Path, operation: &'static str, source: E) -> CorrectionError
where
    E: std::error::Error + 'static,
{
    CorrectionError::Dicom {
        path: path.to_path_buf(),
        operation,
        source: Box::new(source),
    }
}

/// Read a DICOM file into a `(rows, cols, frames)` volume and its spacing
///
/// A single-frame image becomes a volume with one slice. The modality LUT is
/// applied so samples carry rescaled values.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened or its pixel data cannot be decoded
/// - The image has more than one sample per pixel (color data)
pub fn read_dicom_volume(path: &Path) -> Result<(Array3<f64>, Option<[f64; 3]>)> {
    let object = open_file(path)
        .map_err(|e| dicom_error(path, "open", e))?;

    let spacing = header_spacing(&object);

    let decoded = object
        .decode_pixel_data()
        .map_err(|e| dicom_error(path, "decode pixel data", e))?;

    if decoded.samples_per_pixel() != 1 {
        return Err(format_error(
            path,
            &format!(
                "expected grayscale pixel data, got {} samples per pixel",
                decoded.samples_per_pixel()
            ),
        ));
    }

    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::Default);
    let pixels = decoded
        .to_ndarray_with_options::<f64>(&options)
        .map_err(|e| dicom_error(path, "convert pixel data", e))?;

    let &[frames, rows, cols, _] = pixels.shape() else {
        return Err(format_error(
            path,
            &format!("unexpected pixel array shape {:?}", pixels.shape()),
        ));
    };

    let mut volume = Array3::zeros((rows, cols, frames));
    for ((frame, row, col, _), &value) in pixels.indexed_iter() {
        if let Some(slot) = volume.get_mut((row, col, frame)) {
            *slot = value;
        }
    }

    Ok((volume, spacing))
}

/// Convert a DICOM image to a NIfTI volume with a diagonal spacing affine
///
/// # Errors
///
/// Returns an error if the DICOM file cannot be read or the output cannot be
/// written
pub fn dicom_to_nifti(dicom_path: &Path, output_path: &Path) -> Result<Conversion> {
    let (volume, header) = read_dicom_volume(dicom_path)?;

    let spacing = if let Some(spacing) = header {
        info!("Voxel spacing: {spacing:?} mm");
        spacing
    } else {
        warn!(
            "No spacing information found in '{}', using {DEFAULT_VOXEL_SPACING:?}",
            dicom_path.display()
        );
        DEFAULT_VOXEL_SPACING
    };

    if volume.dim().2 == 1 {
        info!("2D image detected, shape: {:?}", volume.dim());
    }

    save_volume(output_path, &volume, spacing)?;
    info!(
        "NIfTI file saved to '{}' with shape {:?}",
        output_path.display(),
        volume.dim()
    );

    Ok(Conversion {
        shape: volume.dim(),
        spacing,
        spacing_from_header: header.is_some(),
    })
}
