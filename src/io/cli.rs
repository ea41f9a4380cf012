//! Command-line interface for converting, fitting and correcting shaded images

use crate::analysis::diagnostics::MaskStatistics;
use crate::analysis::phantom::PhantomSpec;
use crate::correction::fitter::GradientFitter;
use crate::correction::generator::{GradientMapGenerator, ZeroBiasPolicy};
use crate::io::configuration::{
    BIAS_SUFFIX, DEFAULT_LOG_LEVEL, DEFAULT_PHANTOM_SIZE, DEFAULT_SEED, DEFAULT_VOXEL_SPACING,
    MASK_SUFFIX,
    NORMALIZED_SUFFIX, PathSettings, VOLUME_EXTENSION,
};
use crate::io::dicom::dicom_to_nifti;
use crate::io::error::{Result, invalid_parameter};
use crate::io::nifti::{load_mask, load_slice, save_2d};
use crate::io::parameters::{ParameterRecord, load_parameters, save_parameters};
use crate::io::progress::ProgressManager;
use crate::io::visualization::{render_fit_figure, render_mask_overlay};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "biasplane")]
#[command(
    author,
    version,
    about = "Estimate and remove planar shading from single-slice medical images"
)]
/// Command-line arguments for the shading correction tool
pub struct Cli {
    /// Log specification, e.g. `info` or `biasplane=debug`
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Workflow step to run
    #[command(subcommand)]
    pub command: Command,
}

/// Workflow steps
#[derive(Subcommand)]
pub enum Command {
    /// Convert a DICOM image to NIfTI
    Convert(ConvertArgs),
    /// Fit a planar shading model to a masked image
    Fit(FitArgs),
    /// Divide fitted shading out of one or more images
    Apply(ApplyArgs),
    /// Report mask coverage and draw its outline over the image
    Inspect(InspectArgs),
    /// Write a synthetic shaded phantom and its mask
    Phantom(PhantomArgs),
}

/// Arguments of `convert`
#[derive(Args)]
pub struct ConvertArgs {
    /// DICOM file to convert
    #[arg(value_name = "DICOM")]
    pub input: Option<PathBuf>,

    /// Output NIfTI path (defaults next to the input, or in the output directory)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Arguments of `fit`
#[derive(Args)]
pub struct FitArgs {
    /// Image volume to fit
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Region-of-interest mask volume
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// Parameter file to write
    #[arg(short, long)]
    pub params: Option<PathBuf>,

    /// Save a figure of image, mask and bias map
    #[arg(long, value_name = "PNG")]
    pub plot: Option<PathBuf>,

    /// Save the fitted bias map as a volume
    #[arg(long, value_name = "NIFTI")]
    pub bias_map: Option<PathBuf>,
}

/// Where a reused model is anchored on a new image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CenterSource {
    /// Centroid of the target image's own mask
    #[default]
    Mask,
    /// Center stored in the parameter file
    Model,
}

/// Arguments of `apply`
#[derive(Args)]
pub struct ApplyArgs {
    /// Image volumes to correct
    #[arg(value_name = "TARGETS")]
    pub targets: Vec<PathBuf>,

    /// Parameter file produced by `fit`
    #[arg(short, long)]
    pub params: Option<PathBuf>,

    /// Mask used for every target (defaults to each target's `_mask` sibling)
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// Anchor for the bias map on each target
    #[arg(short, long, value_enum, default_value_t = CenterSource::Mask)]
    pub center: CenterSource,

    /// Output zero where |bias| is at most this value instead of dividing
    #[arg(short = 'e', long, value_name = "EPSILON")]
    pub zero_bias_epsilon: Option<f64>,

    /// Directory for outputs (defaults next to each target)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write each target's bias map
    #[arg(short, long)]
    pub bias_maps: bool,

    /// Process targets even if output exists
    #[arg(short, long)]
    pub no_skip: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl ApplyArgs {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Division policy selected by the flags
    ///
    /// # Errors
    ///
    /// Returns an error if the epsilon is negative or not finite
    pub fn zero_bias_policy(&self) -> Result<ZeroBiasPolicy> {
        match self.zero_bias_epsilon {
            None => Ok(ZeroBiasPolicy::Propagate),
            Some(epsilon) if epsilon.is_finite() && epsilon >= 0.0 => {
                Ok(ZeroBiasPolicy::Zero { epsilon })
            }
            Some(epsilon) => Err(invalid_parameter(
                "zero-bias-epsilon",
                &epsilon,
                &"must be a finite non-negative number",
            )),
        }
    }
}

/// Arguments of `inspect`
#[derive(Args)]
pub struct InspectArgs {
    /// Image volume
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Region-of-interest mask volume
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// Save the image with the mask outline
    #[arg(long, value_name = "PNG")]
    pub plot: Option<PathBuf>,
}

/// Arguments of `phantom`
#[derive(Args)]
pub struct PhantomArgs {
    /// Output image volume; the mask is written beside it
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Edge length in pixels
    #[arg(long, default_value_t = DEFAULT_PHANTOM_SIZE)]
    pub size: usize,

    /// Intensity change per column
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub gradient_x: f64,

    /// Intensity change per row
    #[arg(long, default_value_t = -0.25, allow_negative_numbers = true)]
    pub gradient_y: f64,

    /// Intensity at the disc center
    #[arg(long, default_value_t = 100.0)]
    pub value_at_center: f64,

    /// Relative standard deviation of multiplicative noise
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Random seed for reproducible noise
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

fn resolve(
    argument: Option<&PathBuf>,
    fallback: Option<&PathBuf>,
    parameter: &'static str,
) -> Result<PathBuf> {
    argument.or(fallback).cloned().ok_or_else(|| {
        invalid_parameter(
            parameter,
            &"<unset>",
            &"pass it on the command line or set the matching BIASPLANE_* variable",
        )
    })
}

/// File name without its volume extension (`scan.nii.gz` → `scan`)
pub fn volume_stem(path: &Path) -> String {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    for extension in [".nii.gz", ".nii", ".dcm", ".gz"] {
        if let Some(stem) = name.strip_suffix(extension) {
            return stem.to_string();
        }
    }
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Output path `<dir>/<stem><suffix>.nii.gz`, where `dir` is `output_dir` or
/// the input's own directory
pub fn derived_path(input: &Path, suffix: &str, output_dir: Option<&Path>) -> PathBuf {
    let name = format!("{}{suffix}.{VOLUME_EXTENSION}", volume_stem(input));
    output_dir
        .or_else(|| input.parent())
        .map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name))
}

/// Locate `<stem>_mask.nii.gz` or `<stem>_mask.nii` beside an image
pub fn find_mask_for(image: &Path) -> Option<PathBuf> {
    let stem = volume_stem(image);
    let dir = image.parent().unwrap_or_else(|| Path::new(""));
    ["nii.gz", "nii"]
        .iter()
        .map(|extension| dir.join(format!("{stem}{MASK_SUFFIX}.{extension}")))
        .find(|candidate| candidate.is_file())
}

/// Executes a parsed command against explicit path settings
pub struct CommandRunner {
    cli: Cli,
    settings: PathSettings,
}

impl CommandRunner {
    /// Create a runner; `settings` supply paths the command line leaves out
    pub const fn new(cli: Cli, settings: PathSettings) -> Self {
        Self { cli, settings }
    }

    /// Run the selected command
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Convert(args) => self.convert(args),
            Command::Fit(args) => self.fit(args),
            Command::Apply(args) => self.apply(args),
            Command::Inspect(args) => self.inspect(args),
            Command::Phantom(args) => Self::phantom(args),
        }
    }

    fn convert(&self, args: &ConvertArgs) -> Result<()> {
        let input = resolve(args.input.as_ref(), self.settings.dicom.as_ref(), "dicom")?;
        let output = args.output.clone().unwrap_or_else(|| {
            derived_path(&input, "", self.settings.output_dir.as_deref())
        });

        let conversion = dicom_to_nifti(&input, &output)?;
        info!(
            "Converted '{}' ({}x{}x{})",
            input.display(),
            conversion.shape.0,
            conversion.shape.1,
            conversion.shape.2
        );
        Ok(())
    }

    // Allow print for the fit summary the user asked for
    #[allow(clippy::print_stdout)]
    fn fit(&self, args: &FitArgs) -> Result<()> {
        let image_path = resolve(args.image.as_ref(), self.settings.image.as_ref(), "image")?;
        let mask_path = resolve(args.mask.as_ref(), self.settings.mask.as_ref(), "mask")?;
        let params_path = resolve(args.params.as_ref(), self.settings.params.as_ref(), "params")?;

        info!("Loading image and mask...");
        let slice = load_slice(&image_path)?;
        let mask = load_mask(&mask_path)?;

        let outcome = GradientFitter::new().fit(&slice.pixels, &mask)?;
        println!("=== Fitted Parameters ===\n{outcome}");

        save_parameters(&params_path, &ParameterRecord::from(&outcome))?;

        if args.plot.is_some() || args.bias_map.is_some() {
            let bias_map = outcome.model.bias_map(slice.pixels.dim())?;
            if let Some(ref plot) = args.plot {
                render_fit_figure(&slice.pixels, &mask, &bias_map, &outcome.model, plot)?;
            }
            if let Some(ref path) = args.bias_map {
                save_2d(path, &bias_map, slice.spacing)?;
            }
        }

        Ok(())
    }

    fn apply(&self, args: &ApplyArgs) -> Result<()> {
        let params_path = resolve(args.params.as_ref(), self.settings.params.as_ref(), "params")?;
        let record = load_parameters(&params_path)?;
        if args.center == CenterSource::Model && !record.center_stored {
            return Err(invalid_parameter(
                "center",
                &"model",
                &format!("'{}' stores no model center", params_path.display()),
            ));
        }
        let generator = GradientMapGenerator::new(args.zero_bias_policy()?);
        debug!("Zero-bias policy: {:?}", generator.policy());
        let output_dir = args
            .output_dir
            .as_deref()
            .or(self.settings.output_dir.as_deref());

        let targets = if args.targets.is_empty() {
            vec![resolve(None, self.settings.image.as_ref(), "targets")?]
        } else {
            args.targets.clone()
        };

        let mut progress = ProgressManager::new();
        if args.should_show_progress() {
            progress.initialize(targets.len());
        }

        for target in &targets {
            let output = derived_path(target, NORMALIZED_SUFFIX, output_dir);
            if args.skip_existing() && output.exists() {
                warn!("Skipping: {} (output exists)", target.display());
                progress.skip_file();
                continue;
            }

            progress.start_file(target);
            let start_time = Instant::now();

            let mask_path = match args.mask.clone() {
                Some(mask) => mask,
                None => find_mask_for(target).ok_or_else(|| {
                    invalid_parameter(
                        "mask",
                        &target.display(),
                        &format!("no {MASK_SUFFIX} volume found beside this target"),
                    )
                })?,
            };

            Self::apply_one(target, &mask_path, &output, &record, &generator, args, output_dir)?;

            progress.complete_file(start_time.elapsed());
        }

        progress.finish();
        info!(
            "Corrected {} of {} targets, skipped {}",
            progress.completed(),
            targets.len(),
            progress.skipped()
        );
        Ok(())
    }

    fn apply_one(
        target: &Path,
        mask_path: &Path,
        output: &Path,
        record: &ParameterRecord,
        generator: &GradientMapGenerator,
        args: &ApplyArgs,
        output_dir: Option<&Path>,
    ) -> Result<()> {
        let slice = load_slice(target)?;
        let mask = load_mask(mask_path)?;

        let model = match args.center {
            CenterSource::Mask => record.model.recentered(mask.centroid()?),
            CenterSource::Model => record.model,
        };
        let center = model.center();
        info!(
            "Correcting '{}' around ({:.2}, {:.2})",
            target.display(),
            center.x,
            center.y
        );

        let bias_map = model.bias_map(slice.pixels.dim())?;
        let normalized = generator.apply(&slice.pixels, &bias_map, &mask)?;
        save_2d(output, &normalized, slice.spacing)?;

        if args.bias_maps {
            save_2d(
                &derived_path(target, BIAS_SUFFIX, output_dir),
                &bias_map,
                slice.spacing,
            )?;
        }
        Ok(())
    }

    // Allow print for the statistics the user asked for
    #[allow(clippy::print_stdout)]
    fn inspect(&self, args: &InspectArgs) -> Result<()> {
        let image_path = resolve(args.image.as_ref(), self.settings.image.as_ref(), "image")?;
        let mask_path = resolve(args.mask.as_ref(), self.settings.mask.as_ref(), "mask")?;

        let slice = load_slice(&image_path)?;
        let mask = load_mask(&mask_path)?;

        let (rows, cols) = slice.pixels.dim();
        println!("Image shape: {rows}x{cols}");
        println!("{}", MaskStatistics::from_mask(&mask));

        if let Some(ref plot) = args.plot {
            render_mask_overlay(&slice.pixels, &mask, plot)?;
        }
        Ok(())
    }

    fn phantom(args: &PhantomArgs) -> Result<()> {
        let phantom = PhantomSpec {
            size: args.size,
            gradient_x: args.gradient_x,
            gradient_y: args.gradient_y,
            value_at_center: args.value_at_center,
            noise: args.noise,
            seed: args.seed,
        }
        .generate()?;

        let spacing = DEFAULT_VOXEL_SPACING;
        let mask_path = derived_path(&args.output, MASK_SUFFIX, None);
        save_2d(&args.output, &phantom.image, spacing)?;
        save_2d(&mask_path, &phantom.mask.to_values(), spacing)?;
        info!(
            "Phantom written to '{}' with mask '{}'",
            args.output.display(),
            mask_path.display()
        );
        Ok(())
    }
}
