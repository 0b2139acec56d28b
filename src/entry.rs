use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::args::HeyyallArgs;
use crate::config::{LoadTestConfig, load_config, resolve_config};
use crate::error::{AppError, AppResult, MetricsError, ValidationError};
use crate::http::{ClientSettings, ReqwestIssuer};
use crate::metrics::spawn_stats_aggregator;
use crate::report::{render_report, write_report};
use crate::scheduler::{Requestor, RunTargets, Scheduler};
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

pub(crate) fn run() -> AppResult<()> {
    let args = HeyyallArgs::parse();
    crate::logger::init_logging(args.log_level, args.no_color);

    let result = build_runtime(args.cpus).and_then(|runtime| runtime.block_on(run_async(&args)));
    if let Err(err) = &result {
        error!("{}", err);
    }
    result
}

fn build_runtime(cpus: usize) -> AppResult<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if cpus > 0 {
        let available = std::thread::available_parallelism().map_or(1, usize::from);
        if cpus > available {
            return Err(AppError::validation(ValidationError::CpusExceedAvailable {
                requested: cpus,
                available,
            }));
        }
        builder.worker_threads(cpus);
    }
    builder
        .build()
        .map_err(|source| AppError::validation(ValidationError::RuntimeBuildFailed { source }))
}

fn run_targets(config: &LoadTestConfig) -> RunTargets {
    RunTargets {
        concurrency: config.concurrency,
        rate: config.rqst_rate,
        run_duration: config.run_duration,
        num_requests: config.num_requests,
        distribution: config.worker_distribution,
    }
}

async fn run_async(args: &HeyyallArgs) -> AppResult<()> {
    let config = resolve_config(&load_config(args.config.as_deref())?)?;
    info!(
        "Loaded {} endpoints, concurrency {}, rate {}/s.",
        config.endpoints.len(),
        config.concurrency,
        config.rqst_rate
    );

    // The scheduler rejects zero concurrency; the channel and pool still need
    // a non-zero size before it gets the chance.
    let capacity = config.concurrency.max(1);
    let settings =
        ClientSettings::new(args.timeout, capacity).with_client_cert(config.client_cert.clone());
    let issuer = Arc::new(ReqwestIssuer::new(settings)?);

    let (response_tx, response_rx) = mpsc::channel(capacity);
    let targets = run_targets(&config);
    let scheduler = Scheduler::new(
        targets,
        config.endpoints,
        Requestor::new(issuer, response_tx),
    )?;

    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handler = setup_signal_shutdown_handler(&shutdown_tx);
    let started = Instant::now();
    let aggregator = spawn_stats_aggregator(response_rx, args.norm_factor, started);

    let schedule = scheduler.start(&shutdown_tx).await;
    signal_handler.abort();
    if schedule.failed_tasks > 0 {
        warn!("{} worker tasks did not finish cleanly.", schedule.failed_tasks);
    }

    let results = aggregator
        .await
        .map_err(|source| AppError::metrics(MetricsError::AggregatorStopped { source }))?;
    let report = render_report(&results, args.out)?;
    write_report(&mut std::io::stdout().lock(), &report)?;
    Ok(())
}
