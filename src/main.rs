mod args;
mod config;
mod domain;
mod entry;
mod error;
mod http;
mod logger;
mod metrics;
mod report;
mod scheduler;
mod shutdown;
mod shutdown_handlers;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
