//! # Simply-Supported Span Analysis
//!
//! Checked beam response quantities for a simply-supported bridge span under
//! a uniformly distributed load. Every function is pure: the same arguments
//! always produce bit-identical results.
//!
//! ## Units
//!
//! - Span `L`: metres
//! - Load `w`: kN per metre
//! - Modulus `E`: kN/m²
//! - Second moment of area `I`: m⁴
//!
//! ## Example
//!
//! ```rust
//! use gad_core::calculations::beam::{summarize, DEFAULT_E, DEFAULT_I};
//!
//! let results = summarize(20.0, 15.0, DEFAULT_E, DEFAULT_I).unwrap();
//! assert_eq!(results.get("bending_moment_kNm"), Some(750.0));
//! assert_eq!(results.get("shear_force_kN"), Some(150.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::equations::beam::{uniform_load_max_deflection, uniform_load_max_moment, uniform_load_max_shear};
use crate::errors::{GadError, GadResult};
use crate::values::{Parameters, Results};

/// Default modulus of elasticity (kN/m²)
pub const DEFAULT_E: f64 = 2.1e8;

/// Default second moment of area (m⁴)
pub const DEFAULT_I: f64 = 2.5e-3;

/// Parameter keys recognized in an input sheet
pub mod keys {
    pub const SPAN: &str = "SPAN";
    pub const LOAD: &str = "LOAD";
    pub const E: &str = "E";
    pub const I: &str = "I";
}

/// Result keys, in the order [`summarize`] emits them
pub const RESULT_KEYS: [&str; 7] = [
    "span",
    "load",
    "E",
    "I",
    "bending_moment_kNm",
    "shear_force_kN",
    "deflection_m",
];

/// Input for one simply-supported span.
///
/// ## JSON Example
///
/// ```json
/// { "span_m": 20.0, "load_kn_per_m": 15.0, "e_kn_per_m2": 2.1e8, "i_m4": 0.0025 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamInput {
    pub span_m: f64,
    pub load_kn_per_m: f64,
    #[serde(default = "default_e")]
    pub e_kn_per_m2: f64,
    #[serde(default = "default_i")]
    pub i_m4: f64,
}

fn default_e() -> f64 {
    DEFAULT_E
}

fn default_i() -> f64 {
    DEFAULT_I
}

impl BeamInput {
    /// Span and load with the default section properties
    pub fn new(span_m: f64, load_kn_per_m: f64) -> Self {
        BeamInput {
            span_m,
            load_kn_per_m,
            e_kn_per_m2: DEFAULT_E,
            i_m4: DEFAULT_I,
        }
    }

    pub fn with_section(mut self, e_kn_per_m2: f64, i_m4: f64) -> Self {
        self.e_kn_per_m2 = e_kn_per_m2;
        self.i_m4 = i_m4;
        self
    }

    /// Build an input from a parameter mapping.
    ///
    /// `SPAN` and `LOAD` are required; `E` and `I` fall back to the
    /// supplied defaults. Unknown keys are ignored. `source` names the
    /// sheet in the error message.
    pub fn from_parameters(params: &Parameters, source: &str, default_e: f64, default_i: f64) -> GadResult<Self> {
        let span = params
            .get(keys::SPAN)
            .ok_or_else(|| GadError::input_format(source, "missing required variable 'SPAN'"))?;
        let load = params
            .get(keys::LOAD)
            .ok_or_else(|| GadError::input_format(source, "missing required variable 'LOAD'"))?;

        Ok(BeamInput {
            span_m: span,
            load_kn_per_m: load,
            e_kn_per_m2: params.get(keys::E).unwrap_or(default_e),
            i_m4: params.get(keys::I).unwrap_or(default_i),
        })
    }
}

/// Run [`summarize`] on a [`BeamInput`].
pub fn calculate(input: &BeamInput) -> GadResult<Results> {
    summarize(input.span_m, input.load_kn_per_m, input.e_kn_per_m2, input.i_m4)
}

/// Maximum bending moment (kN·m) at midspan: wL²/8
pub fn bending_moment(span: f64, load: f64) -> GadResult<f64> {
    check_span(span)?;
    check_load(load)?;
    if load == 0.0 {
        return Ok(0.0);
    }
    check_result("span", span, uniform_load_max_moment(load, span))
}

/// Maximum shear force (kN) at the supports: wL/2
pub fn shear_force(span: f64, load: f64) -> GadResult<f64> {
    check_span(span)?;
    check_load(load)?;
    if load == 0.0 {
        return Ok(0.0);
    }
    check_result("span", span, uniform_load_max_shear(load, span))
}

/// Maximum deflection (m) at midspan: 5wL⁴/(384EI)
///
/// Zero load gives exactly zero whatever the section. A span or section
/// whose deflection overflows `f64` is a domain error naming the span.
pub fn deflection(span: f64, load: f64, e: f64, i: f64) -> GadResult<f64> {
    check_span(span)?;
    check_load(load)?;
    check_positive("E", e)?;
    check_positive("I", i)?;
    if load == 0.0 {
        return Ok(0.0);
    }
    check_result("span", span, uniform_load_max_deflection(load, span, e, i))
}

/// Compute all response quantities and echo the inputs.
///
/// Keys are emitted in [`RESULT_KEYS`] order.
pub fn summarize(span: f64, load: f64, e: f64, i: f64) -> GadResult<Results> {
    let moment = bending_moment(span, load)?;
    let shear = shear_force(span, load)?;
    let delta = deflection(span, load, e, i)?;

    let mut results = Results::new();
    results.insert(RESULT_KEYS[0], span);
    results.insert(RESULT_KEYS[1], load);
    results.insert(RESULT_KEYS[2], e);
    results.insert(RESULT_KEYS[3], i);
    results.insert(RESULT_KEYS[4], moment);
    results.insert(RESULT_KEYS[5], shear);
    results.insert(RESULT_KEYS[6], delta);
    Ok(results)
}

fn check_span(span: f64) -> GadResult<()> {
    check_positive("span", span)
}

fn check_load(load: f64) -> GadResult<()> {
    if !load.is_finite() {
        return Err(GadError::domain("load", load, "must be a finite number"));
    }
    if load < 0.0 {
        return Err(GadError::domain("load", load, "must not be negative"));
    }
    Ok(())
}

/// Rejects a computed quantity that left the finite range.
fn check_result(argument: &str, input: f64, value: f64) -> GadResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GadError::domain(argument, input, "result out of range"))
    }
}

fn check_positive(argument: &str, value: f64) -> GadResult<()> {
    if !value.is_finite() {
        return Err(GadError::domain(argument, value, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(GadError::domain(argument, value, "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_span() {
        let results = summarize(20.0, 15.0, 2.1e8, 2.5e-3).unwrap();

        assert_eq!(results.get("bending_moment_kNm"), Some(750.0));
        assert_eq!(results.get("shear_force_kN"), Some(150.0));

        // δ = 5 * 15 * 20⁴ / (384 * 2.1e8 * 2.5e-3) = 0.0595238...
        let delta = results.get("deflection_m").unwrap();
        assert!((delta - 0.059_523_809_523_809_5).abs() < 1e-15, "δ = {}", delta);
    }

    #[test]
    fn test_key_order() {
        let results = summarize(20.0, 15.0, DEFAULT_E, DEFAULT_I).unwrap();
        let keys: Vec<_> = results.keys().collect();
        assert_eq!(keys, RESULT_KEYS.to_vec());
        assert_eq!(results.get("span"), Some(20.0));
        assert_eq!(results.get("I"), Some(DEFAULT_I));
    }

    #[test]
    fn test_zero_load() {
        let results = summarize(10.0, 0.0, DEFAULT_E, DEFAULT_I).unwrap();
        assert_eq!(results.get("bending_moment_kNm"), Some(0.0));
        assert_eq!(results.get("shear_force_kN"), Some(0.0));
        assert_eq!(results.get("deflection_m"), Some(0.0));
    }

    #[test]
    fn test_zero_load_is_exactly_zero_at_extremes() {
        let huge_span = summarize(1e80, 0.0, DEFAULT_E, DEFAULT_I).unwrap();
        assert_eq!(huge_span.get("bending_moment_kNm"), Some(0.0));
        assert_eq!(huge_span.get("deflection_m"), Some(0.0));

        let tiny_section = summarize(10.0, 0.0, 1e-200, 1e-200).unwrap();
        assert_eq!(tiny_section.get("deflection_m"), Some(0.0));
    }

    #[test]
    fn test_overflowing_result_is_domain_error() {
        let err = summarize(1e160, 1.0, DEFAULT_E, DEFAULT_I).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
        assert!(err.to_string().contains("result out of range"));

        // 384·E·I underflows to zero
        let err = deflection(10.0, 1.0, 1e-200, 1e-200).unwrap_err();
        assert!(matches!(err, GadError::Domain { ref reason, .. } if reason == "result out of range"));

        assert!(deflection(1e80, 1.0, DEFAULT_E, DEFAULT_I).is_err());
        assert!(bending_moment(1e80, 1.0).is_ok());
    }

    #[test]
    fn test_negative_span_is_domain_error() {
        let err = bending_moment(-1.0, 1.0).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
        assert!(matches!(err, GadError::Domain { ref argument, .. } if argument == "span"));
    }

    #[test]
    fn test_forbidden_values() {
        assert!(shear_force(0.0, 1.0).is_err());
        assert!(shear_force(10.0, -0.5).is_err());
        assert!(bending_moment(f64::NAN, 1.0).is_err());
        assert!(bending_moment(10.0, f64::INFINITY).is_err());
        assert!(deflection(10.0, 1.0, 0.0, DEFAULT_I).is_err());
        assert!(deflection(10.0, 1.0, DEFAULT_E, -1e-3).is_err());
        assert!(summarize(10.0, 1.0, DEFAULT_E, f64::NAN).is_err());
    }

    #[test]
    fn test_from_parameters_defaults() {
        let params: Parameters = [("SPAN", 12.0), ("LOAD", 8.0), ("ABTLEN", 9.5)].into_iter().collect();
        let input = BeamInput::from_parameters(&params, "input.xlsx", DEFAULT_E, DEFAULT_I).unwrap();
        assert_eq!(input, BeamInput::new(12.0, 8.0));
    }

    #[test]
    fn test_from_parameters_missing_load() {
        let params: Parameters = [("SPAN", 12.0)].into_iter().collect();
        let err = BeamInput::from_parameters(&params, "input.xlsx", DEFAULT_E, DEFAULT_I).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_FORMAT_ERROR");
    }

    #[test]
    fn test_calculate_uses_section() {
        let input = BeamInput::new(10.0, 5.0).with_section(3.0e7, 1.0e-2);
        let results = calculate(&input).unwrap();
        assert_eq!(results.get("E"), Some(3.0e7));
        assert_eq!(results.get("I"), Some(1.0e-2));
    }

    #[test]
    fn test_input_json_defaults() {
        let input: BeamInput = serde_json::from_str(r#"{"span_m": 20.0, "load_kn_per_m": 15.0}"#).unwrap();
        assert_eq!(input.e_kn_per_m2, DEFAULT_E);
        assert_eq!(input.i_m4, DEFAULT_I);
    }
}
