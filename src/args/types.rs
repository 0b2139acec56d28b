use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Multiplier of the fastest observed latency that caps the histogram range.
/// Zero disables the cap; one would collapse every bin and is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormFactor(u64);

impl NormFactor {
    pub const DISABLED: Self = Self(0);

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.0 > 1
    }
}

impl TryFrom<u64> for NormFactor {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 1 {
            return Err(ValidationError::InvalidNormFactor);
        }
        Ok(Self(value))
    }
}

impl std::str::FromStr for NormFactor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|source| ValidationError::InvalidNumber { source })?;
        Self::try_from(value)
    }
}

impl std::fmt::Display for NormFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
