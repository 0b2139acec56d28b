use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, warn};

use crate::http::{HttpIssuer, OutboundRequest};
use crate::metrics::Response;
use crate::shutdown::{ShutdownReceiver, wait_for_shutdown};

use super::{RequestProcessor, WorkerAssignment, WorkerExit, WorkerLimit, WorkerReport};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Issues an endpoint's requests through an `HttpIssuer` and forwards one
/// `Response` per completed request to the stats aggregator.
pub struct Requestor<I> {
    issuer: Arc<I>,
    responses: mpsc::Sender<Response>,
}

impl<I> Requestor<I> {
    #[must_use]
    pub const fn new(issuer: Arc<I>, responses: mpsc::Sender<Response>) -> Self {
        Self { issuer, responses }
    }
}

#[async_trait]
impl<I> RequestProcessor for Requestor<I>
where
    I: HttpIssuer + 'static,
{
    async fn process_requests(
        &self,
        assignment: WorkerAssignment,
        mut shutdown_rx: ShutdownReceiver,
    ) -> WorkerReport {
        let WorkerAssignment {
            endpoint,
            limit,
            rate,
        } = assignment;
        if endpoint.url.is_empty() {
            warn!("Endpoint has no URL, worker exits without sending requests.");
            return WorkerReport::new(0, WorkerExit::Finished);
        }

        let pacing = pacing_interval(rate);
        let request = OutboundRequest::for_endpoint(&endpoint);
        let mut completed: u64 = 0;

        loop {
            if let WorkerLimit::Requests(max) = limit
                && completed >= max
            {
                return WorkerReport::new(completed, WorkerExit::Finished);
            }
            if let WorkerLimit::Until(deadline) = limit
                && Instant::now() >= deadline
            {
                return WorkerReport::new(completed, WorkerExit::DeadlineReached);
            }

            let started = Instant::now();
            let issued = tokio::select! {
                biased;
                () = wait_for_shutdown(&mut shutdown_rx) => {
                    return WorkerReport::new(completed, WorkerExit::Cancelled);
                }
                () = deadline_reached(limit) => {
                    return WorkerReport::new(completed, WorkerExit::DeadlineReached);
                }
                result = self.issuer.issue(&request) => result,
            };
            let issued = match issued {
                Ok(issued) => issued,
                Err(err) => {
                    match limit {
                        WorkerLimit::Requests(max) => warn!(
                            "{} {} failed, dropping {} remaining requests for this worker: {}",
                            endpoint.method,
                            endpoint.url,
                            max.saturating_sub(completed),
                            err
                        ),
                        WorkerLimit::Until(deadline) => warn!(
                            "{} {} failed, dropping this worker's remaining {:?} of run time: {}",
                            endpoint.method,
                            endpoint.url,
                            deadline.saturating_duration_since(Instant::now()),
                            err
                        ),
                        WorkerLimit::Unbounded => warn!(
                            "{} {} failed, worker stops: {}",
                            endpoint.method, endpoint.url, err
                        ),
                    }
                    return WorkerReport::new(completed, WorkerExit::RequestFailed);
                }
            };

            let response = Response {
                status: issued.status,
                url: endpoint.url.clone(),
                method: endpoint.method,
                duration: started.elapsed(),
                timings: issued.timings,
            };
            tokio::select! {
                biased;
                () = wait_for_shutdown(&mut shutdown_rx) => {
                    return WorkerReport::new(completed, WorkerExit::Cancelled);
                }
                sent = self.responses.send(response) => {
                    if sent.is_err() {
                        debug!("Stats aggregator stopped, worker exits.");
                        return WorkerReport::new(completed, WorkerExit::ChannelClosed);
                    }
                }
            }
            completed = completed.saturating_add(1);

            if let WorkerLimit::Requests(max) = limit
                && completed >= max
            {
                return WorkerReport::new(completed, WorkerExit::Finished);
            }

            if let Some(interval) = pacing
                && let Some(pause) = interval.checked_sub(started.elapsed())
                && !pause.is_zero()
            {
                tokio::select! {
                    biased;
                    () = wait_for_shutdown(&mut shutdown_rx) => {
                        return WorkerReport::new(completed, WorkerExit::Cancelled);
                    }
                    () = deadline_reached(limit) => {
                        return WorkerReport::new(completed, WorkerExit::DeadlineReached);
                    }
                    () = sleep(pause) => {}
                }
            }
        }
    }
}

/// Time budget per request at `rate` requests per second; `None` when
/// unthrottled.
fn pacing_interval(rate: u64) -> Option<Duration> {
    NANOS_PER_SEC.checked_div(rate).map(Duration::from_nanos)
}

async fn deadline_reached(limit: WorkerLimit) {
    match limit {
        WorkerLimit::Until(deadline) => sleep_until(deadline).await,
        WorkerLimit::Requests(_) | WorkerLimit::Unbounded => std::future::pending::<()>().await,
    }
}
