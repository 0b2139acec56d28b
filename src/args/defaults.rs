pub(crate) const DEFAULT_USER_AGENT: &str = concat!("heyyall/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout used when `--timeout` is not given.
pub(crate) const DEFAULT_REQUEST_TIMEOUT: &str = "15s";
