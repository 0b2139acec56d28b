//! Configuration loading and validation.
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::resolve_config;
pub use loader::load_config;
pub use types::LoadTestConfig;

#[cfg(test)]
pub(crate) use loader::load_config_file;
pub(crate) use parse::parse_duration_value;
