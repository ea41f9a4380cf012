//! Flat JSON parameter file holding a fitted gradient model

use crate::correction::model::{FitOutcome, GradientModel};
use crate::io::error::{CorrectionError, Result, WithPath};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk record: the model fields plus the fit score, all at top level
///
/// Older files store only the gradients and the center value. Those load with
/// the origin at `(0, 0)` and `center_stored` cleared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct ParameterRecord {
    /// Fitted model
    #[serde(flatten)]
    pub model: GradientModel,
    /// Coefficient of determination of the fit, when known
    #[serde(rename = "r2", skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    /// Whether the file carried the model origin
    #[serde(skip)]
    pub center_stored: bool,
}

#[derive(Deserialize)]
struct StoredRecord {
    center_x: Option<f64>,
    center_y: Option<f64>,
    gradient_x: f64,
    gradient_y: f64,
    value_at_center: f64,
    r2: Option<f64>,
}

impl From<StoredRecord> for ParameterRecord {
    fn from(stored: StoredRecord) -> Self {
        let center = stored.center_x.zip(stored.center_y);
        let (center_x, center_y) = center.unwrap_or_default();
        Self {
            model: GradientModel {
                center_x,
                center_y,
                gradient_x: stored.gradient_x,
                gradient_y: stored.gradient_y,
                value_at_center: stored.value_at_center,
            },
            r_squared: stored.r2,
            center_stored: center.is_some(),
        }
    }
}

impl From<&FitOutcome> for ParameterRecord {
    fn from(outcome: &FitOutcome) -> Self {
        Self {
            model: outcome.model,
            r_squared: Some(outcome.r_squared),
            center_stored: true,
        }
    }
}

impl From<GradientModel> for ParameterRecord {
    fn from(model: GradientModel) -> Self {
        Self {
            model,
            r_squared: None,
            center_stored: true,
        }
    }
}

/// Write a parameter record as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written
pub fn save_parameters(path: &Path, record: &ParameterRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record).map_err(|source| {
        CorrectionError::Parameters {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    std::fs::write(path, json).with_path(path, "write parameters")?;
    info!("Saved gradient parameters to '{}'", path.display());
    Ok(())
}

/// Read a parameter record
///
/// # Errors
///
/// Returns an error if the file cannot be read or lacks a gradient or the
/// center value
pub fn load_parameters(path: &Path) -> Result<ParameterRecord> {
    let json = std::fs::read_to_string(path).with_path(path, "read parameters")?;
    serde_json::from_str(&json).map_err(|source| CorrectionError::Parameters {
        path: path.to_path_buf(),
        source,
    })
}
