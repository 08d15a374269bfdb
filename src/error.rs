use thiserror::Error;

/// Caller-visible engine failures. Everything else in the engine has a
/// documented fallback value instead of an error path; fetch and IO
/// failures travel through `anyhow` at the binary boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid week start '{0}': expected YYYY-MM-DD")]
    InvalidWeekStart(String),
}
