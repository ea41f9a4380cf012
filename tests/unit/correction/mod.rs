pub mod fitter;
