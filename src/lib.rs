//! Core library for the `heyyall` CLI.
//!
//! This crate provides the building blocks used by the binary: weighted
//! endpoint configuration, the worker scheduler, the reqwest-backed request
//! issuer, response aggregation with percentiles and histograms, and report
//! rendering. The primary user-facing interface is the `heyyall`
//! command-line application; library APIs may evolve as the CLI grows.
pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod shutdown;
pub mod shutdown_handlers;
