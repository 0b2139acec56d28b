use clap::Parser;

use crate::error::{AppError, AppResult};

use super::HeyyallArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<HeyyallArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    HeyyallArgs::try_parse_from(args).map_err(AppError::from)
}
