//! # Structural Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `calculate(input) -> Result<Results, GadError>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`beam`] - Simply-supported span under uniform load

pub mod beam;

pub use beam::{bending_moment, calculate, deflection, shear_force, summarize, BeamInput};
