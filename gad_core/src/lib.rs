//! # gad_core - Bridge General Arrangement Drawing Engine
//!
//! `gad_core` holds the analysis kernel and plugin machinery behind the
//! `bridge-gad` tool. Engineers analyze a simply-supported span from a
//! parameter workbook or command-line values, and extend the tool with
//! bridge-type plugins that run isolated in child processes.
//!
//! ## Design Philosophy
//!
//! - **Pure kernel**: Beam formulas take numbers and return numbers
//! - **Rich Errors**: Structured error types, not just strings
//! - **Contained plugins**: A plugin can crash or hang without taking the host down
//!
//! ## Quick Start
//!
//! ```rust
//! use gad_core::calculations::beam::summarize;
//!
//! let results = summarize(20.0, 15.0, 2.0e8, 0.004).unwrap();
//! assert_eq!(results.get("bending_moment_kNm"), Some(750.0));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Validated beam analysis
//! - [`equations`] - Closed-form beam formulas
//! - [`values`] - Ordered name/value mappings
//! - [`file_io`] - Parameter and result workbooks, atomic writes
//! - [`config`] - TOML configuration and resolved settings
//! - [`plugins`] - Plugin contract, discovery, registry, sandbox
//! - [`logger`] - Daily sandbox and crash log
//! - [`facade`] - One entry point for front ends
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod config;
pub mod equations;
pub mod errors;
pub mod facade;
pub mod file_io;
pub mod logger;
pub mod plugins;
pub mod values;

// Re-export commonly used types at crate root for convenience
pub use config::Settings;
pub use errors::{GadError, GadResult};
pub use facade::{AnalysisRequest, BridgeGad};
pub use logger::DailyLog;
pub use values::{Parameters, Results};
