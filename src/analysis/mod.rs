//! Region statistics and synthetic test data

/// Mask coverage statistics
pub mod diagnostics;
/// Seeded synthetic phantoms with planar shading
pub mod phantom;
