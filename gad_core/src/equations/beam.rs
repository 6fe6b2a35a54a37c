//! # Simply-Supported Beam Formulas
//!
//! Closed-form equations for a simply-supported span under a uniformly
//! distributed load. The beam has a pin support at left (x=0) and a roller
//! at right (x=L).
//!
//! These functions perform no validation; the checked entry points live in
//! [`crate::calculations::beam`].
//!
//! ## Notation
//!
//! - `L` = Span length (m)
//! - `x` = Position along beam from left support (m)
//! - `w` = Uniform load intensity (kN/m)
//! - `M` = Bending moment (kN·m)
//! - `V` = Shear force (kN)
//! - `δ` = Deflection (m)
//! - `E` = Modulus of elasticity (kN/m²)
//! - `I` = Second moment of area (m⁴)
//! - `R1` = Left reaction, `R2` = Right reaction (kN)
//!
//! ## Sign Conventions
//!
//! - Loads: Positive downward
//! - Moment: Positive causes tension on bottom (sagging)
//! - Shear: Positive when left side up relative to right
//! - Deflection: Positive downward
//! - Reactions: Positive upward
//!
//! ## References
//!
//! - Roark's Formulas for Stress and Strain, 8th Edition, Table 8.1
//! - IRC:112 worked examples for slab and girder decks

// =============================================================================
// UNIFORM LOAD FORMULAS
// Simply-supported beam with uniform load w over entire span
// =============================================================================

/// Calculate reactions for uniform load w over full span L
///
/// ```text
///    ↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓ w
///    ═════════════════
///    △                △
///   R1  ←─────L─────→ R2
/// ```
///
/// # Formula
/// R1 = R2 = wL/2
#[inline]
pub fn uniform_load_reactions(w: f64, l: f64) -> (f64, f64) {
    let r = w * l / 2.0;
    (r, r)
}

/// Calculate shear at position x for uniform load w over full span
///
/// # Formula
/// V(x) = w(L/2 - x)
///
/// - At x=0: V = +wL/2
/// - At x=L/2: V = 0
/// - At x=L: V = -wL/2
#[inline]
pub fn uniform_load_shear(w: f64, l: f64, x: f64) -> f64 {
    w * (l / 2.0 - x)
}

/// Maximum shear for uniform load (at the supports)
///
/// # Formula
/// V_max = wL/2
#[inline]
pub fn uniform_load_max_shear(w: f64, l: f64) -> f64 {
    w * l / 2.0
}

/// Calculate moment at position x for uniform load w over full span
///
/// # Formula (Roark's Table 8.1, Case 2a)
/// M(x) = wx(L-x)/2
#[inline]
pub fn uniform_load_moment(w: f64, l: f64, x: f64) -> f64 {
    w * x * (l - x) / 2.0
}

/// Maximum moment for uniform load (at midspan)
///
/// # Formula
/// M_max = wL²/8
#[inline]
pub fn uniform_load_max_moment(w: f64, l: f64) -> f64 {
    w * l * l / 8.0
}

/// Calculate deflection at position x for uniform load w
///
/// # Formula (Roark's Table 8.1, Case 2a)
/// δ(x) = wx(L³ - 2Lx² + x³) / (24EI)
#[inline]
pub fn uniform_load_deflection(w: f64, l: f64, x: f64, e: f64, i: f64) -> f64 {
    w * x * (l.powi(3) - 2.0 * l * x * x + x.powi(3)) / (24.0 * e * i)
}

/// Maximum deflection for uniform load (at midspan)
///
/// # Formula
/// δ_max = 5wL⁴ / (384EI)
#[inline]
pub fn uniform_load_max_deflection(w: f64, l: f64, e: f64, i: f64) -> f64 {
    5.0 * w * l.powi(4) / (384.0 * e * i)
}

// =============================================================================
// UNIT TESTS
// =============================================================================
