use isg_core::error::IsgError;
use isg_core::scoring::{AiRiskAnalysis, RiskAssessment};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::output;

pub fn score(
    probability: Decimal,
    severity: Decimal,
    frequency: Decimal,
    method_file: Option<PathBuf>,
    output_format: &str,
) -> Result<(), IsgError> {
    let method = isg_core::resolve_method(method_file.as_deref())?;
    let assessment = method.assess(probability, severity, frequency);
    emit(&method.name, &assessment, output_format)
}

pub fn classify(
    score: Decimal,
    method_file: Option<PathBuf>,
    output_format: &str,
) -> Result<(), IsgError> {
    let method = isg_core::resolve_method(method_file.as_deref())?;
    let assessment = method.assess_score(score);
    emit(&method.name, &assessment, output_format)
}

pub fn ai(
    input_file: PathBuf,
    method_file: Option<PathBuf>,
    output_format: &str,
) -> Result<(), IsgError> {
    let method = isg_core::resolve_method(method_file.as_deref())?;
    let content = std::fs::read_to_string(&input_file)?;
    let analysis = AiRiskAnalysis::from_json(&content)?;
    let assessment = method.ingest_ai(&analysis)?;

    if output_format != "json" {
        if let Some(ref hazard) = analysis.hazard {
            println!("Hazard: {hazard}");
        }
        if let Some(ref summary) = analysis.summary {
            println!("Analysis: {summary}");
        }
        if analysis.hazard.is_some() || analysis.summary.is_some() {
            println!();
        }
    }
    emit(&method.name, &assessment, output_format)
}

fn emit(method: &str, assessment: &RiskAssessment, output_format: &str) -> Result<(), IsgError> {
    match output_format {
        "json" => output::json::print(assessment)?,
        _ => output::table::print_assessment(method, assessment),
    }
    Ok(())
}
