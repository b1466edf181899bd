use isg_core::error::IsgError;
use isg_core::presets;
use isg_core::scoring::{RiskFactor, ScoringMethod};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

pub fn list() -> Result<(), IsgError> {
    println!("Available predefined scoring methods:\n");
    for name in presets::METHOD_PRESETS {
        let method = presets::load_method_preset(name)?;
        println!("  {:<12} {} (v{})", name, method.name, method.version);
        if let Some(ref desc) = method.description {
            println!("               {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(file: Option<PathBuf>) -> Result<(), IsgError> {
    let method = isg_core::resolve_method(file.as_deref())?;

    println!("{} (version {})\n", method.name, method.version);
    if let Some(ref desc) = method.description {
        println!("{}\n", desc);
    }

    println!("Risk score = probability x severity x frequency.\n");

    for factor in RiskFactor::ALL {
        println!("{}:", capitalize(&factor.to_string()));
        for level in method.scales.get(factor) {
            println!("  {:>6}  {}", level.value.normalize(), level.label);
        }
        println!();
    }

    println!("Bands (a score falls into the first band whose bound it does not exceed):\n");
    let mut lower: Option<Decimal> = None;
    for band in &method.bands {
        let range = match (lower, band.upper_bound) {
            (None, Some(upper)) => format!("<= {}", upper.normalize()),
            (Some(low), Some(upper)) => format!("{} - {}", low.normalize(), upper.normalize()),
            (Some(low), None) => format!("> {}", low.normalize()),
            (None, None) => "any".to_string(),
        };
        println!("  {:<12} {:<16} {}", range, band.label, band.recommendation);
        lower = band.upper_bound;
    }

    Ok(())
}

pub fn schema() -> Result<(), IsgError> {
    print!(
        r#"JSON Scoring Method Schema
==========================

A method file defines the selectable values of the three Fine-Kinney
factors and the bands a risk score is mapped to. It is used with
`isg score --method`, `isg register --method` and the wizard commands.

Top-level fields:
  name          (string, required)  Human-readable name of the method
  description   (string, optional)  What this method is for
  version       (string, required)  Version identifier (e.g., "1.0")
  scales        (object, required)  Selectable values per factor (see below)
  bands         (array, required)   Ordered list of bands, lowest first

"scales" has three arrays: "probability", "frequency" and "severity".
Each entry:
  value         (string, required)  Decimal value, e.g. "0.5" or "10".
                                    Values must be positive and strictly
                                    ascending within a scale.
  label         (string, required)  What the value means

Each band in the "bands" array:
  id            (string, required)  Stable identifier, unique in the method
  label         (string, required)  Display label
  upper_bound   (string, optional)  Inclusive upper bound of the band.
                                    Bounds must be strictly ascending.
                                    Only the last band omits it; it covers
                                    every score above the previous bound.
  recommendation
                (string, required)  Action to take for risks in this band

A score falls into the first band whose upper_bound it does not exceed.

Example:
{{
  "name": "Site method",
  "version": "1.0",
  "scales": {{
    "probability": [{{ "value": "1", "label": "Unlikely" }}, {{ "value": "6", "label": "Likely" }}],
    "frequency":   [{{ "value": "1", "label": "Rare" }}, {{ "value": "6", "label": "Daily" }}],
    "severity":    [{{ "value": "3", "label": "Minor" }}, {{ "value": "40", "label": "Fatal" }}]
  }},
  "bands": [
    {{ "id": "low", "label": "Low", "upper_bound": "50", "recommendation": "Monitor" }},
    {{ "id": "high", "label": "High", "recommendation": "Act now" }}
  ]
}}
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), IsgError> {
    let method = isg_core::scoring::load_method(file)?;

    println!("Method '{}' (v{}) is valid.", method.name, method.version);
    println!(
        "  Bands: {}",
        method
            .bands
            .iter()
            .map(|b| b.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let warnings = warnings(&method);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

/// Issues that do not make a method unusable.
fn warnings(method: &ScoringMethod) -> Vec<String> {
    let mut warnings = Vec::new();

    for band in &method.bands {
        if band.recommendation.trim().is_empty() {
            warnings.push(format!("band '{}' has no recommendation", band.id));
        }
    }

    let mut min = Decimal::ONE;
    let mut max = Decimal::ONE;
    for factor in RiskFactor::ALL {
        let levels = method.scales.get(factor);
        if let (Some(first), Some(last)) = (levels.first(), levels.last()) {
            min *= first.value;
            max *= last.value;
        }
    }

    let lowest = method.rank(&method.classify(min).id);
    let highest = method.rank(&method.classify(max).id);
    for band in &method.bands {
        let rank = method.rank(&band.id);
        if rank < lowest || rank > highest {
            warnings.push(format!(
                "band '{}' cannot be reached with the scale values (scores range {} - {})",
                band.id,
                min.normalize(),
                max.normalize()
            ));
        }
    }

    warnings
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
