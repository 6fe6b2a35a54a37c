use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use gad_core::AnalysisRequest;

use super::load_app;
use crate::GlobalOpts;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Span length L (m)
    #[arg(long, allow_negative_numbers = true)]
    pub span: Option<f64>,

    /// Uniform load w (kN/m)
    #[arg(long, allow_negative_numbers = true)]
    pub load: Option<f64>,

    /// Modulus of elasticity (kN/m²)
    #[arg(long = "E", allow_negative_numbers = true)]
    pub e: Option<f64>,

    /// Second moment of area (m⁴)
    #[arg(long = "I", allow_negative_numbers = true)]
    pub i: Option<f64>,

    /// Parameter workbook with Variable/Value columns
    #[arg(long, value_name = "PARAMS.xlsx")]
    pub input: Option<PathBuf>,

    /// Write results to this workbook
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

pub fn handle(args: AnalyzeArgs, global: &GlobalOpts) -> Result<ExitCode> {
    let app = load_app(global)?;

    let request = AnalysisRequest {
        span: args.span,
        load: args.load,
        e: args.e,
        i: args.i,
        input: args.input,
        out: args.out,
    };
    let results = app.analyze(&request)?;

    for (name, value) in results.iter() {
        println!("{}={}", name, value);
    }
    if let Some(out) = &request.out {
        eprintln!("Results written to {}", out.display());
    }
    Ok(ExitCode::SUCCESS)
}
