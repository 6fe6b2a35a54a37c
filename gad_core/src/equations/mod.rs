//! # Structural Engineering Equations
//!
//! Closed-form structural mechanics equations used by the analysis kernel.
//! Keeping the raw formulas apart from the validated calculations makes
//! them easy to check against references.
//!
//! ## Modules
//!
//! - [`beam`] - Simply-supported beam formulas (moment, shear, deflection)
//!
//! ## Sign Conventions
//!
//! - **Loads**: Positive downward (gravity direction)
//! - **Moment**: Positive causes tension on bottom fiber (sagging)
//! - **Shear**: Positive when left side moves up relative to right
//! - **Deflection**: Positive downward

pub mod beam;

pub use beam::{
    uniform_load_deflection,
    uniform_load_max_deflection,
    uniform_load_max_moment,
    uniform_load_max_shear,
    uniform_load_moment,
    uniform_load_reactions,
    uniform_load_shear,
};
