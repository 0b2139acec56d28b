//! Renders finished run results for the terminal or for machines.
mod json;
mod text;


use std::io::Write;

use crate::args::OutputType;
use crate::error::ReportError;
use crate::metrics::RunResults;

pub use json::render_json;
pub use text::render_text;

/// Renders `results` in the requested output type.
///
/// # Errors
///
/// Returns an error when JSON serialization fails.
pub fn render_report(results: &RunResults, out: OutputType) -> Result<String, ReportError> {
    match out {
        OutputType::Text => Ok(render_text(results)),
        OutputType::Json => render_json(results),
    }
}

/// Writes a rendered report to `writer`, adding a final newline.
///
/// # Errors
///
/// Returns an error when the writer fails.
pub fn write_report<W: Write>(writer: &mut W, report: &str) -> Result<(), ReportError> {
    writeln!(writer, "{}", report)
        .and_then(|()| writer.flush())
        .map_err(|source| ReportError::WriteOutput { source })
}
