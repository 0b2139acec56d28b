//! Turns weighted endpoints into worker tasks and runs them to completion.
mod alloc;
mod requestor;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::{Endpoint, RunBound, WorkerDistribution};
use crate::error::ValidationError;
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

pub use alloc::{EndpointAllocation, calc_endpoint_allocation};
pub use requestor::Requestor;

/// Global targets the scheduler splits across endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTargets {
    pub concurrency: usize,
    /// Requests per second across the whole run; zero is unthrottled.
    pub rate: u64,
    pub run_duration: Duration,
    pub num_requests: u64,
    pub distribution: WorkerDistribution,
}

/// How long one worker keeps issuing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerLimit {
    Requests(u64),
    Until(Instant),
    /// The run deadline lies beyond the clock's range.
    Unbounded,
}

/// Everything a worker owns for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerAssignment {
    pub endpoint: Endpoint,
    pub limit: WorkerLimit,
    /// Requests per second for this worker; zero is unthrottled.
    pub rate: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Finished,
    DeadlineReached,
    Cancelled,
    RequestFailed,
    ChannelClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub completed: u64,
    pub exit: WorkerExit,
}

impl WorkerReport {
    #[must_use]
    pub const fn new(completed: u64, exit: WorkerExit) -> Self {
        Self { completed, exit }
    }
}

/// Runs one worker's share of the load.
#[async_trait]
pub trait RequestProcessor: Send + Sync + 'static {
    async fn process_requests(
        &self,
        assignment: WorkerAssignment,
        shutdown_rx: ShutdownReceiver,
    ) -> WorkerReport;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub workers_spawned: usize,
    pub workers: Vec<WorkerReport>,
    /// Worker tasks that panicked or were aborted.
    pub failed_tasks: usize,
}

impl ScheduleReport {
    #[must_use]
    pub fn requests_completed(&self) -> u64 {
        self.workers
            .iter()
            .fold(0_u64, |total, worker| total.saturating_add(worker.completed))
    }
}

pub struct Scheduler<P> {
    targets: RunTargets,
    bound: RunBound,
    endpoints: Vec<Endpoint>,
    processor: Arc<P>,
}

impl<P> std::fmt::Debug for Scheduler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("targets", &self.targets)
            .field("bound", &self.bound)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl<P> Scheduler<P>
where
    P: RequestProcessor,
{
    /// Validates the run targets against the endpoints.
    ///
    /// # Errors
    ///
    /// Returns the first rule the targets break; nothing is spawned.
    pub fn new(
        targets: RunTargets,
        endpoints: Vec<Endpoint>,
        processor: P,
    ) -> Result<Self, ValidationError> {
        validate_targets(&targets, &endpoints)?;
        let bound = RunBound::from_targets(targets.num_requests, targets.run_duration);
        Ok(Self {
            targets,
            bound,
            endpoints,
            processor: Arc::new(processor),
        })
    }

    #[must_use]
    pub const fn bound(&self) -> RunBound {
        self.bound
    }

    /// Allocation each endpoint receives, in endpoint order.
    #[must_use]
    pub fn allocations(&self) -> Vec<EndpointAllocation> {
        self.endpoints
            .iter()
            .map(|endpoint| {
                calc_endpoint_allocation(
                    endpoint,
                    self.targets.concurrency,
                    self.targets.rate,
                    self.bound,
                )
            })
            .collect()
    }

    /// Spawns every worker, waits for all of them, then releases the
    /// processor. Once this returns no worker can emit another response.
    pub async fn start(self, shutdown_tx: &ShutdownSender) -> ScheduleReport {
        let started = Instant::now();
        let duration_limit = match self.bound {
            RunBound::ByCount(_) => None,
            RunBound::ByDuration(duration) => Some(
                started
                    .checked_add(duration)
                    .map_or(WorkerLimit::Unbounded, WorkerLimit::Until),
            ),
        };

        let allocations = self.allocations();
        let mut handles = Vec::with_capacity(self.targets.concurrency);
        for (endpoint, allocation) in self.endpoints.iter().zip(allocations) {
            if allocation.worker_count == 0 {
                warn!(
                    "{} {} has rqst_percent 0 and gets no workers.",
                    endpoint.method, endpoint.url
                );
                continue;
            }
            debug!(
                "{} {}: {} workers, {} requests and {} requests/sec each",
                endpoint.method,
                endpoint.url,
                allocation.worker_count,
                allocation.per_worker_requests,
                allocation.per_worker_rate
            );

            let limit =
                duration_limit.unwrap_or(WorkerLimit::Requests(allocation.per_worker_requests));
            for _ in 0..allocation.worker_count {
                let assignment = WorkerAssignment {
                    endpoint: endpoint.clone(),
                    limit,
                    rate: allocation.per_worker_rate,
                };
                let shutdown_rx = shutdown_tx.subscribe();
                let processor = Arc::clone(&self.processor);
                handles.push(tokio::spawn(async move {
                    processor.process_requests(assignment, shutdown_rx).await
                }));
            }
        }

        let mut report = ScheduleReport {
            workers_spawned: handles.len(),
            workers: Vec::with_capacity(handles.len()),
            failed_tasks: 0,
        };
        info!("Started {} workers.", report.workers_spawned);

        for handle in handles {
            match handle.await {
                Ok(worker) => report.workers.push(worker),
                Err(err) => {
                    error!("Worker task failed: {}", err);
                    report.failed_tasks = report.failed_tasks.saturating_add(1);
                }
            }
        }
        drop(self.processor);

        info!(
            "All workers finished after {:?}, {} requests completed.",
            started.elapsed(),
            report.requests_completed()
        );
        report
    }
}

fn validate_targets(targets: &RunTargets, endpoints: &[Endpoint]) -> Result<(), ValidationError> {
    let endpoint_count = endpoints.len();
    let endpoint_count_u64 = u64::try_from(endpoint_count).unwrap_or(u64::MAX);
    let concurrency_u64 = u64::try_from(targets.concurrency).unwrap_or(u64::MAX);
    let by_count = targets.run_duration.is_zero();

    if endpoint_count == 0 {
        return Err(ValidationError::NoEndpoints);
    }
    if targets.concurrency == 0 {
        return Err(ValidationError::ConcurrencyZero);
    }
    if targets.num_requests > 0 && !by_count {
        return Err(ValidationError::CountAndDuration {
            num_requests: targets.num_requests,
            run_duration: targets.run_duration,
        });
    }
    if by_count && targets.num_requests < concurrency_u64 {
        return Err(ValidationError::RequestsBelowConcurrency {
            num_requests: targets.num_requests,
            concurrency: targets.concurrency,
        });
    }
    if by_count && endpoint_count_u64 > targets.num_requests {
        return Err(ValidationError::MoreEndpointsThanRequests {
            endpoints: endpoint_count,
            num_requests: targets.num_requests,
        });
    }
    match targets.distribution {
        WorkerDistribution::Ceiling if targets.concurrency < endpoint_count => {
            return Err(ValidationError::ConcurrencyBelowEndpoints {
                concurrency: targets.concurrency,
                endpoints: endpoint_count,
            });
        }
        WorkerDistribution::Even
            if targets
                .concurrency
                .checked_rem(endpoint_count)
                .is_some_and(|rem| rem != 0) =>
        {
            return Err(ValidationError::UnevenDistribution {
                concurrency: targets.concurrency,
                endpoints: endpoint_count,
            });
        }
        WorkerDistribution::Ceiling | WorkerDistribution::Even => {}
    }

    let total = endpoints
        .iter()
        .fold(0_u64, |sum, endpoint| sum.saturating_add(endpoint.rqst_percent));
    if total != 100 {
        return Err(ValidationError::WeightSum { total });
    }
    Ok(())
}
