use isg_core::register::RegisterReport;
use isg_core::scoring::{RiskAssessment, ScoreSource};
use isg_core::wizard::WizardSession;

pub fn print_assessment(method: &str, assessment: &RiskAssessment) {
    println!("=== {} ===\n", method);

    if let (Some(p), Some(s), Some(f)) = (
        assessment.probability,
        assessment.severity,
        assessment.frequency,
    ) {
        println!(
            "  Probability {} x Severity {} x Frequency {}",
            p.normalize(),
            s.normalize(),
            f.normalize()
        );
    }
    match assessment.score {
        Some(score) => println!("  Score: {}", score),
        None => println!("  Score: (not given)"),
    }
    println!("  Band:  {} ({})", assessment.label, assessment.band_id);
    println!("  Action: {}", assessment.recommendation);

    if assessment.source == ScoreSource::Ai {
        if let Some(ref reported) = assessment.ai_band_mismatch {
            println!(
                "\n  Note: the analysis reported '{}', the score places it in '{}'.",
                reported, assessment.label
            );
        }
    }
    println!();
}

pub fn print_register(report: &RegisterReport, details: bool) {
    println!("=== {} ===\n", report.method);

    if report.rows.is_empty() {
        println!("  No scorable rows.\n");
    } else {
        let max_hazard = report
            .rows
            .iter()
            .map(|r| r.entry.hazard.chars().count())
            .max()
            .unwrap_or(10)
            .min(48);

        for row in &report.rows {
            let score = row
                .assessment
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let off_scale = if row.off_scale.is_empty() { "" } else { " (?)" };
            let hazard: String = row.entry.hazard.chars().take(max_hazard).collect();
            println!(
                "  {:<width$}  {:>8}  {}{}",
                hazard,
                score,
                row.assessment.label,
                off_scale,
                width = max_hazard
            );
            if details {
                if !row.off_scale.is_empty() {
                    let factors: Vec<String> =
                        row.off_scale.iter().map(|f| f.to_string()).collect();
                    println!("    not on the method scale: {}", factors.join(", "));
                }
                println!("    {}", row.assessment.recommendation);
            }
        }
        println!();
    }

    println!("  Summary:");
    for band in &report.summary {
        println!("    {:<16} {}", band.label, band.count);
    }
    println!();

    if !report.skipped.is_empty() {
        if details {
            println!("  Skipped rows:");
            for skipped in &report.skipped {
                println!("    {}  ({})", skipped.row_text, skipped.reason);
            }
        } else {
            println!(
                "  {} row(s) skipped; use --details to list them.",
                report.skipped.len()
            );
        }
        println!();
    }
}

pub fn print_session(session: &WizardSession) {
    let definition = session.definition();
    let step = session.step();

    println!("=== {} ===\n", definition.name);
    println!(
        "  Step {} of {}: {} ({})",
        session.current_step() + 1,
        definition.steps.len(),
        step.label,
        step.id
    );
    println!("  Progress: {}%\n", session.compute_progress());

    let width = definition
        .fields
        .iter()
        .map(|f| f.name.len())
        .max()
        .unwrap_or(10);
    for field in &definition.fields {
        let value = session
            .get(&field.name)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let marker = if field.derive.is_some() { "=" } else { ":" };
        println!("  {:<width$} {} {}", field.name, marker, value);
    }
    println!();

    if let Err(err) = session.validate_step(session.current_step()) {
        println!("  To continue: {}", err.reason);
        println!();
    }
}
