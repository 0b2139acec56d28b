use crate::error::ReportError;
use crate::metrics::RunResults;

/// Pretty-printed JSON of the complete results, durations in nanoseconds.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn render_json(results: &RunResults) -> Result<String, ReportError> {
    serde_json::to_string_pretty(results).map_err(|source| ReportError::SerializeJson { source })
}
