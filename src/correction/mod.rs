//! Planar shading estimation and removal

/// Least-squares fitting of the planar model to a masked image
pub mod fitter;
/// Bias map evaluation and division
pub mod generator;
/// Fitted model parameters and fit outcome
pub mod model;

pub use fitter::GradientFitter;
pub use generator::{BiasMap, GradientMapGenerator, ZeroBiasPolicy};
pub use model::{FitOutcome, GradientModel};
