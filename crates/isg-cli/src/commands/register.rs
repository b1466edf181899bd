use isg_core::error::IsgError;
use isg_core::register;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    method_file: Option<PathBuf>,
    output_format: &str,
    details: bool,
) -> Result<(), IsgError> {
    let method = isg_core::resolve_method(method_file.as_deref())?;
    let parsed = register::load_register(&input_file)?;
    let report = register::score_register(&parsed, &method);

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_register(&report, details),
    }

    Ok(())
}
