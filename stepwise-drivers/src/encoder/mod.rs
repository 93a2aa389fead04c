//! Encoder implementations
//!
//! Quadrature signals are decoded edge by edge (usually in an interrupt or
//! an edge-waiting task) into a shared atomic counter; the experiment reads
//! that counter through [`QuadratureEncoder`].

pub mod quadrature;

pub use quadrature::{QuadratureDecoder, QuadratureEncoder};
