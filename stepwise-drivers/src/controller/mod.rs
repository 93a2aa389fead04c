//! Position controller implementations

pub mod proportional;

pub use proportional::ProportionalController;
