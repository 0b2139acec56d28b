//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::HeyyallArgs;
pub use types::{LogLevel, NormFactor, OutputType};

pub(crate) use defaults::DEFAULT_USER_AGENT;
pub(crate) use parsers::parse_header;
