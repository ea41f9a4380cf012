//! NIfTI-1 reading and writing for single-slice images
//!
//! Axes map as `[i, j, k] → [row, col, slice]`, matching how the converter
//! lays out DICOM pixel arrays. Files ending in `.gz` are gzip-compressed.

use crate::io::error::{CorrectionError, Result, WithPath, format_error, invalid_input};
use crate::spatial::mask::Mask;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info};
use ndarray::{Array2, Array3, Axis};
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiObject};
use std::io::{Cursor, Write};
use std::path::Path;

const HEADER_SIZE: usize = 348;
const VOX_OFFSET: usize = 352;
const DT_FLOAT32: i16 = 16;
const NIFTI_XFORM_SCANNER_ANAT: i16 = 1;

/// A 2D image together with the voxel spacing stored in its header
#[derive(Debug, Clone)]
pub struct Slice {
    /// Samples indexed `[row, col]`
    pub pixels: Array2<f64>,
    /// Voxel spacing along rows, columns and slices
    pub spacing: [f64; 3],
}

/// Check if bytes are gzip compressed
const fn is_gzip(bytes: &[u8]) -> bool {
    matches!(bytes, [0x1f, 0x8b, ..])
}

fn parse_object(path: &Path, bytes: &[u8]) -> Result<InMemNiftiObject> {
    let parsed = if is_gzip(bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes)))
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))
    };
    parsed.map_err(|source| CorrectionError::NiftiRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a single-slice image and its voxel spacing
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read or is not valid NIfTI
/// - The volume has more than one slice along any axis past the second
pub fn load_slice(path: &Path) -> Result<Slice> {
    let bytes = std::fs::read(path).with_path(path, "read volume")?;
    let object = parse_object(path, &bytes)?;

    let pixdim = object.header().pixdim;
    let spacing = [1, 2, 3].map(|axis| {
        pixdim
            .get(axis)
            .map(|&d| f64::from(d))
            .filter(|d| *d > 0.0 && d.is_finite())
            .unwrap_or(1.0)
    });

    let array = object
        .into_volume()
        .into_ndarray::<f64>()
        .map_err(|source| CorrectionError::NiftiRead {
            path: path.to_path_buf(),
            source,
        })?;
    let shape = array.shape().to_vec();
    debug!("Loaded '{}' with shape {shape:?}", path.display());

    let pixels = squeeze_to_2d(path, &shape, array.iter().copied().collect())?;
    Ok(Slice { pixels, spacing })
}

/// Load a single-slice image
///
/// # Errors
///
/// See [`load_slice`]
pub fn load_2d(path: &Path) -> Result<Array2<f64>> {
    load_slice(path).map(|slice| slice.pixels)
}

/// Load a mask volume, treating any non-zero sample as in-region
///
/// # Errors
///
/// See [`load_slice`]
pub fn load_mask(path: &Path) -> Result<Mask> {
    load_2d(path).map(|pixels| Mask::from_values(&pixels))
}

/// Reduce a row-major sample buffer of the given shape to a 2D grid
///
/// Axes after the second must all have extent one.
///
/// # Errors
///
/// Returns a format error for fewer than two axes, any extra axis longer than
/// one, or a buffer that does not match the shape
pub fn squeeze_to_2d(path: &Path, shape: &[usize], values: Vec<f64>) -> Result<Array2<f64>> {
    let [rows, cols, extra @ ..] = shape else {
        return Err(format_error(
            path,
            &format!("expected a 2D image, got shape {shape:?}"),
        ));
    };

    if let Some((axis, &extent)) = extra.iter().enumerate().find(|&(_, &n)| n > 1) {
        return Err(format_error(
            path,
            &format!(
                "expected a single slice but axis {} has {extent} entries (shape {shape:?})",
                axis + 2
            ),
        ));
    }
    if !extra.is_empty() {
        info!(
            "'{}' is a single-slice volume {shape:?}, using it as a 2D image",
            path.display()
        );
    }

    Array2::from_shape_vec((*rows, *cols), values)
        .map_err(|e| format_error(path, &format!("sample buffer does not match shape: {e}")))
}

fn put(header: &mut [u8], offset: usize, bytes: &[u8]) {
    if let Some(slot) = header.get_mut(offset..offset + bytes.len()) {
        slot.copy_from_slice(bytes);
    }
}

/// Encode a volume as an uncompressed NIfTI-1 single file
///
/// Samples are stored as float32 in NIfTI (x fastest) order with an sform of
/// `diag(spacing, 1)`.
///
/// # Errors
///
/// Returns an error if any dimension is zero or exceeds the NIfTI-1 limit
pub fn encode_volume(volume: &Array3<f64>, spacing: [f64; 3]) -> Result<Vec<u8>> {
    let (nx, ny, nz) = volume.dim();
    let to_dim = |n: usize| {
        i16::try_from(n)
            .ok()
            .filter(|&d| d > 0)
            .ok_or_else(|| invalid_input(&format!("volume dimension {n} is outside 1..=32767")))
    };
    let dim: [i16; 8] = [3, to_dim(nx)?, to_dim(ny)?, to_dim(nz)?, 1, 1, 1, 1];

    let mut header = [0u8; HEADER_SIZE];

    put(&mut header, 0, &(HEADER_SIZE as i32).to_le_bytes());
    for (i, d) in dim.iter().enumerate() {
        put(&mut header, 40 + i * 2, &d.to_le_bytes());
    }
    put(&mut header, 70, &DT_FLOAT32.to_le_bytes());
    put(&mut header, 72, &32i16.to_le_bytes());

    let pixdim: [f32; 8] = [
        1.0,
        spacing[0] as f32,
        spacing[1] as f32,
        spacing[2] as f32,
        1.0,
        1.0,
        1.0,
        1.0,
    ];
    for (i, p) in pixdim.iter().enumerate() {
        put(&mut header, 76 + i * 4, &p.to_le_bytes());
    }

    put(&mut header, 108, &(VOX_OFFSET as f32).to_le_bytes());
    put(&mut header, 112, &1.0f32.to_le_bytes());
    put(&mut header, 116, &0.0f32.to_le_bytes());
    put(&mut header, 254, &NIFTI_XFORM_SCANNER_ANAT.to_le_bytes());

    // srow_x, srow_y, srow_z of a diagonal affine
    for (row, &scale) in spacing.iter().enumerate() {
        for col in 0..4 {
            let value = if col == row { scale as f32 } else { 0.0 };
            put(&mut header, 280 + row * 16 + col * 4, &value.to_le_bytes());
        }
    }
    put(&mut header, 344, b"n+1\0");

    let mut buffer = Vec::with_capacity(VOX_OFFSET + volume.len() * 4);
    buffer.extend_from_slice(&header);
    buffer.extend_from_slice(&[0u8; VOX_OFFSET - HEADER_SIZE]);

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let value = volume.get((i, j, k)).copied().unwrap_or(0.0) as f32;
                buffer.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    Ok(buffer)
}

/// Write a volume to disk, gzip-compressed when the path ends in `.gz`
///
/// # Errors
///
/// Returns an error if encoding fails or the file cannot be written
pub fn save_volume(path: &Path, volume: &Array3<f64>, spacing: [f64; 3]) -> Result<()> {
    let encoded = encode_volume(volume, spacing)?;

    let bytes = if path.extension().is_some_and(|ext| ext == "gz") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&encoded)
            .with_path(path, "compress volume")?;
        encoder.finish().with_path(path, "compress volume")?
    } else {
        encoded
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    std::fs::write(path, bytes).with_path(path, "write volume")?;
    debug!("Wrote volume {:?} to '{}'", volume.dim(), path.display());
    Ok(())
}

/// Write a 2D image as a single-slice volume
///
/// # Errors
///
/// See [`save_volume`]
pub fn save_2d(path: &Path, pixels: &Array2<f64>, spacing: [f64; 3]) -> Result<()> {
    let volume = pixels.view().insert_axis(Axis(2)).to_owned();
    save_volume(path, &volume, spacing)
}
