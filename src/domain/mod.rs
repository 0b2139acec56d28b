//! Immutable run inputs: endpoints and run bounds.
mod endpoint;
mod run;

pub use endpoint::{ClientCert, Endpoint, HttpMethod};
pub use run::{RunBound, WorkerDistribution};
