use clap::Parser;
use std::time::Duration;

use super::defaults::DEFAULT_REQUEST_TIMEOUT;
use super::parsers::{parse_duration_arg, parse_norm_factor};
use super::types::{LogLevel, NormFactor, OutputType};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Weighted HTTP load generator: spreads concurrency, request rate and request count across endpoints and reports latency statistics."
)]
pub struct HeyyallArgs {
    /// Config file (.toml or .json); defaults to ./heyyall.toml, then ./heyyall.json
    #[arg(long, short = 'c', env = "HEYYALL_CONFIG")]
    pub config: Option<String>,

    /// Log level used when HEYYALL_LOG and RUST_LOG are unset
    #[arg(
        long = "log-level",
        alias = "loglevel",
        value_enum,
        ignore_case = true,
        default_value_t = LogLevel::Warn
    )]
    pub log_level: LogLevel,

    /// Report format
    #[arg(long = "out", short = 'o', value_enum, default_value_t = OutputType::Text)]
    pub out: OutputType,

    /// Histogram normalization factor: caps bins at nf * fastest latency (0 disables, 1 is invalid)
    #[arg(long = "nf", default_value = "0", value_parser = parse_norm_factor)]
    pub norm_factor: NormFactor,

    /// Runtime worker threads (0 uses every available CPU)
    #[arg(long = "cpus", default_value_t = 0)]
    pub cpus: usize,

    /// Per-request timeout (e.g. 500ms, 15s, 1m)
    #[arg(long, default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Disable color output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
