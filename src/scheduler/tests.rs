use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::*;
use crate::domain::HttpMethod;
use crate::error::{AppError, AppResult, RequestError};
use crate::http::{HttpIssuer, IssuedResponse, OutboundRequest};
use crate::metrics::{NetworkTimings, Response};
use crate::shutdown::request_shutdown;
use crate::shutdown_handlers::shutdown_channel;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn endpoint(path: &str, pct: u64) -> Endpoint {
    Endpoint::new(format!("http://localhost:8080/{}", path), HttpMethod::Get, pct)
}

fn by_count(concurrency: usize, rate: u64, num_requests: u64) -> RunTargets {
    RunTargets {
        concurrency,
        rate,
        run_duration: Duration::ZERO,
        num_requests,
        distribution: WorkerDistribution::Ceiling,
    }
}

fn by_duration(concurrency: usize, rate: u64, run_duration: Duration) -> RunTargets {
    RunTargets {
        concurrency,
        rate,
        run_duration,
        num_requests: 0,
        distribution: WorkerDistribution::Ceiling,
    }
}

/// Records assignments instead of issuing requests.
#[derive(Default)]
struct RecordingProcessor {
    assignments: Arc<Mutex<Vec<WorkerAssignment>>>,
}

#[async_trait]
impl RequestProcessor for RecordingProcessor {
    async fn process_requests(
        &self,
        assignment: WorkerAssignment,
        _shutdown_rx: ShutdownReceiver,
    ) -> WorkerReport {
        let completed = match assignment.limit {
            WorkerLimit::Requests(count) => count,
            WorkerLimit::Until(_) | WorkerLimit::Unbounded => 0,
        };
        if let Ok(mut assignments) = self.assignments.lock() {
            assignments.push(assignment);
        }
        WorkerReport::new(completed, WorkerExit::Finished)
    }
}

#[derive(Default)]
struct FakeIssuer {
    calls: AtomicU64,
    fail_after: Option<u64>,
    hang: bool,
}

#[async_trait]
impl HttpIssuer for FakeIssuer {
    async fn issue(&self, _request: &OutboundRequest<'_>) -> Result<IssuedResponse, RequestError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail_after.is_some_and(|limit| call > limit) {
            return Err(RequestError::Unavailable {
                reason: "connection refused".to_owned(),
            });
        }
        Ok(IssuedResponse {
            status: 200,
            timings: NetworkTimings {
                round_trip: Some(Duration::from_micros(50)),
                ..NetworkTimings::default()
            },
        })
    }
}

fn expect_rejected(
    targets: RunTargets,
    endpoints: Vec<Endpoint>,
    check: fn(&ValidationError) -> bool,
) -> AppResult<()> {
    match Scheduler::new(targets, endpoints, RecordingProcessor::default()) {
        Err(err) if check(&err) => Ok(()),
        Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::validation("Expected targets to be rejected")),
    }
}

#[test]
fn allocation_matches_reference_table() -> AppResult<()> {
    struct Case {
        percents: &'static [u64],
        concurrency: usize,
        rate: u64,
        num_requests: u64,
        expected: &'static [(u64, usize, u64)],
    }
    let cases = [
        Case {
            percents: &[100],
            concurrency: 1,
            rate: 10,
            num_requests: 100,
            expected: &[(100, 1, 10)],
        },
        Case {
            percents: &[100],
            concurrency: 2,
            rate: 10,
            num_requests: 100,
            expected: &[(50, 2, 5)],
        },
        Case {
            percents: &[100],
            concurrency: 3,
            rate: 10,
            num_requests: 100,
            expected: &[(34, 3, 4)],
        },
        Case {
            percents: &[75, 25],
            concurrency: 4,
            rate: 100,
            num_requests: 100,
            expected: &[(25, 3, 25), (25, 1, 25)],
        },
        Case {
            percents: &[80, 20],
            concurrency: 4,
            rate: 100,
            num_requests: 100,
            expected: &[(20, 4, 20), (20, 1, 20)],
        },
        Case {
            percents: &[50, 30, 20],
            concurrency: 4,
            rate: 99,
            num_requests: 99,
            expected: &[(25, 2, 25), (15, 2, 15), (20, 1, 20)],
        },
    ];

    for case in cases {
        let endpoints: Vec<Endpoint> = case
            .percents
            .iter()
            .enumerate()
            .map(|(idx, pct)| endpoint(&format!("ep{}", idx), *pct))
            .collect();
        let scheduler = Scheduler::new(
            by_count(case.concurrency, case.rate, case.num_requests),
            endpoints,
            RecordingProcessor::default(),
        )?;
        let actual: Vec<(u64, usize, u64)> = scheduler
            .allocations()
            .into_iter()
            .map(|alloc| {
                (
                    alloc.per_worker_requests,
                    alloc.worker_count,
                    alloc.per_worker_rate,
                )
            })
            .collect();
        if actual != case.expected {
            return Err(AppError::validation(format!(
                "percents {:?} concurrency {}: got {:?}, expected {:?}",
                case.percents, case.concurrency, actual, case.expected
            )));
        }
    }
    Ok(())
}

#[test]
fn allocation_totals_never_fall_short() -> AppResult<()> {
    let weight_sets: [&[u64]; 4] = [&[100], &[33, 33, 34], &[10, 20, 30, 40], &[1, 99]];
    for percents in weight_sets {
        for concurrency in [4_usize, 7, 16] {
            for num_requests in [16_u64, 101, 1000] {
                let endpoints: Vec<Endpoint> = percents
                    .iter()
                    .enumerate()
                    .map(|(idx, pct)| endpoint(&format!("ep{}", idx), *pct))
                    .collect();
                let scheduler = Scheduler::new(
                    by_count(concurrency, 0, num_requests),
                    endpoints.clone(),
                    RecordingProcessor::default(),
                )?;
                let allocations = scheduler.allocations();

                let mut workers: usize = 0;
                let mut requests: u64 = 0;
                for (endpoint, alloc) in endpoints.iter().zip(&allocations) {
                    let expected_workers =
                        (concurrency as u64).saturating_mul(endpoint.rqst_percent).div_ceil(100);
                    if alloc.worker_count as u64 != expected_workers {
                        return Err(AppError::validation(format!(
                            "worker count {} != {} for {}%",
                            alloc.worker_count, expected_workers, endpoint.rqst_percent
                        )));
                    }
                    workers = workers.saturating_add(alloc.worker_count);
                    requests = requests.saturating_add(
                        alloc
                            .per_worker_requests
                            .saturating_mul(alloc.worker_count as u64),
                    );
                }
                if workers < concurrency {
                    return Err(AppError::validation(format!(
                        "{} workers below concurrency {}",
                        workers, concurrency
                    )));
                }
                if requests < num_requests {
                    return Err(AppError::validation(format!(
                        "{} requests below target {}",
                        requests, num_requests
                    )));
                }
            }
        }
    }
    Ok(())
}

#[test]
fn duration_bound_allocates_no_request_counts() -> AppResult<()> {
    let scheduler = Scheduler::new(
        by_duration(3, 0, Duration::from_secs(10)),
        vec![endpoint("a", 100)],
        RecordingProcessor::default(),
    )?;
    if scheduler.bound() != RunBound::ByDuration(Duration::from_secs(10)) {
        return Err(AppError::validation("Expected duration bound"));
    }
    let allocations = scheduler.allocations();
    let first = allocations
        .first()
        .ok_or_else(|| AppError::validation("Missing allocation"))?;
    if first.per_worker_requests != 0 || first.per_worker_rate != 0 || first.worker_count != 3 {
        return Err(AppError::validation(format!(
            "Unexpected allocation {:?}",
            first
        )));
    }
    Ok(())
}

#[test]
fn validation_rejects_bad_targets() -> AppResult<()> {
    expect_rejected(by_count(1, 0, 10), Vec::new(), |err| {
        matches!(err, ValidationError::NoEndpoints)
    })?;
    expect_rejected(by_count(0, 0, 10), vec![endpoint("a", 100)], |err| {
        matches!(err, ValidationError::ConcurrencyZero)
    })?;
    expect_rejected(
        RunTargets {
            num_requests: 10,
            ..by_duration(1, 0, Duration::from_secs(5))
        },
        vec![endpoint("a", 100)],
        |err| matches!(err, ValidationError::CountAndDuration { .. }),
    )?;
    expect_rejected(by_count(4, 0, 3), vec![endpoint("a", 100)], |err| {
        matches!(err, ValidationError::RequestsBelowConcurrency { .. })
    })?;
    expect_rejected(by_count(1, 0, 0), vec![endpoint("a", 100)], |err| {
        matches!(err, ValidationError::RequestsBelowConcurrency { .. })
    })?;
    expect_rejected(
        by_count(2, 0, 2),
        vec![endpoint("a", 50), endpoint("b", 25), endpoint("c", 25)],
        |err| matches!(err, ValidationError::MoreEndpointsThanRequests { .. }),
    )?;
    expect_rejected(
        by_count(2, 0, 10),
        vec![endpoint("a", 50), endpoint("b", 25), endpoint("c", 25)],
        |err| matches!(err, ValidationError::ConcurrencyBelowEndpoints { .. }),
    )?;
    expect_rejected(
        RunTargets {
            distribution: WorkerDistribution::Even,
            ..by_count(4, 0, 100)
        },
        vec![endpoint("a", 50), endpoint("b", 30), endpoint("c", 20)],
        |err| matches!(err, ValidationError::UnevenDistribution { .. }),
    )?;
    expect_rejected(
        by_count(2, 0, 10),
        vec![endpoint("a", 60), endpoint("b", 30)],
        |err| matches!(err, ValidationError::WeightSum { total: 90 }),
    )?;
    Ok(())
}

#[test]
fn even_distribution_accepts_multiples() -> AppResult<()> {
    let targets = RunTargets {
        distribution: WorkerDistribution::Even,
        ..by_count(4, 0, 100)
    };
    Scheduler::new(
        targets,
        vec![endpoint("a", 50), endpoint("b", 50)],
        RecordingProcessor::default(),
    )?;
    Ok(())
}

#[test]
fn start_spawns_one_task_per_allocated_worker() -> AppResult<()> {
    run_async_test(async {
        let processor = RecordingProcessor::default();
        let assignments = Arc::clone(&processor.assignments);
        let scheduler = Scheduler::new(
            by_count(4, 99, 99),
            vec![endpoint("a", 50), endpoint("b", 30), endpoint("c", 20)],
            processor,
        )?;
        let (shutdown_tx, _) = shutdown_channel();
        let report = scheduler.start(&shutdown_tx).await;

        if report.workers_spawned != 5 || report.failed_tasks != 0 {
            return Err(AppError::validation(format!(
                "Unexpected report {:?}",
                report
            )));
        }
        if report.requests_completed() != 2 * 25 + 2 * 15 + 20 {
            return Err(AppError::validation(format!(
                "Unexpected request total {}",
                report.requests_completed()
            )));
        }

        let recorded = assignments
            .lock()
            .map_err(|err| AppError::validation(format!("assignments lock poisoned: {}", err)))?;
        let per_endpoint = |path: &str| {
            recorded
                .iter()
                .filter(|assignment| assignment.endpoint.url.ends_with(path))
                .count()
        };
        if per_endpoint("/a") != 2 || per_endpoint("/b") != 2 || per_endpoint("/c") != 1 {
            return Err(AppError::validation("Unexpected workers per endpoint"));
        }
        if recorded
            .iter()
            .filter(|assignment| assignment.endpoint.url.ends_with("/c"))
            .any(|assignment| assignment.rate != 20)
        {
            return Err(AppError::validation("Unexpected rate for endpoint c"));
        }
        Ok(())
    })
}

#[test]
fn zero_percent_endpoint_gets_no_workers() -> AppResult<()> {
    run_async_test(async {
        let processor = RecordingProcessor::default();
        let assignments = Arc::clone(&processor.assignments);
        let scheduler = Scheduler::new(
            by_count(2, 0, 10),
            vec![endpoint("live", 100), endpoint("idle", 0)],
            processor,
        )?;
        let (shutdown_tx, _) = shutdown_channel();
        let report = scheduler.start(&shutdown_tx).await;
        if report.workers_spawned != 2 {
            return Err(AppError::validation(format!(
                "Expected 2 workers, got {}",
                report.workers_spawned
            )));
        }
        let recorded = assignments
            .lock()
            .map_err(|err| AppError::validation(format!("assignments lock poisoned: {}", err)))?;
        if recorded
            .iter()
            .any(|assignment| assignment.endpoint.url.ends_with("/idle"))
        {
            return Err(AppError::validation("Idle endpoint should not get workers"));
        }
        Ok(())
    })
}

#[test]
fn requestors_emit_ceiling_rounded_request_count() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer::default());
        let (tx, mut rx) = mpsc::channel::<Response>(2);
        let scheduler = Scheduler::new(
            by_count(2, 1000, 5),
            vec![endpoint("a", 100)],
            Requestor::new(Arc::clone(&issuer), tx),
        )?;
        let (shutdown_tx, _) = shutdown_channel();

        let collector = tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(response) = rx.recv().await {
                received.push(response);
            }
            received
        });
        let report = tokio::time::timeout(TEST_TIMEOUT, scheduler.start(&shutdown_tx))
            .await
            .map_err(|err| AppError::validation(format!("Scheduler did not finish: {}", err)))?;
        let received = tokio::time::timeout(TEST_TIMEOUT, collector)
            .await
            .map_err(|err| AppError::validation(format!("Response channel never closed: {}", err)))??;

        if received.len() != 6 || report.requests_completed() != 6 {
            return Err(AppError::validation(format!(
                "Expected 6 responses, got {} ({:?})",
                received.len(),
                report
            )));
        }
        if issuer.calls.load(Ordering::SeqCst) != 6 {
            return Err(AppError::validation("Expected 6 issued requests"));
        }
        if report
            .workers
            .iter()
            .any(|worker| worker.exit != WorkerExit::Finished)
        {
            return Err(AppError::validation("Expected every worker to finish"));
        }
        if received
            .iter()
            .any(|response| response.status != 200 || response.method != HttpMethod::Get)
        {
            return Err(AppError::validation("Unexpected response contents"));
        }
        Ok(())
    })
}

#[test]
fn shutdown_cancels_in_flight_workers() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer {
            hang: true,
            ..FakeIssuer::default()
        });
        let (tx, mut rx) = mpsc::channel::<Response>(4);
        let scheduler = Scheduler::new(
            by_duration(3, 0, Duration::from_secs(3600)),
            vec![endpoint("slow", 100)],
            Requestor::new(issuer, tx),
        )?;
        let (shutdown_tx, _) = shutdown_channel();
        let trigger = shutdown_tx.clone();

        let run = tokio::spawn(async move { scheduler.start(&shutdown_tx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        request_shutdown(&trigger);

        let report = tokio::time::timeout(TEST_TIMEOUT, run)
            .await
            .map_err(|err| AppError::validation(format!("Workers ignored shutdown: {}", err)))??;
        if report.workers.len() != 3
            || report
                .workers
                .iter()
                .any(|worker| worker.exit != WorkerExit::Cancelled || worker.completed != 0)
        {
            return Err(AppError::validation(format!(
                "Unexpected report {:?}",
                report
            )));
        }
        if rx.recv().await.is_some() {
            return Err(AppError::validation("Expected closed, empty channel"));
        }
        Ok(())
    })
}

#[test]
fn shutdown_before_start_still_cancels_workers() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer {
            hang: true,
            ..FakeIssuer::default()
        });
        let (tx, mut rx) = mpsc::channel::<Response>(4);
        let scheduler = Scheduler::new(
            by_duration(2, 0, Duration::from_secs(3600)),
            vec![endpoint("slow", 100)],
            Requestor::new(Arc::clone(&issuer), tx),
        )?;
        let (shutdown_tx, _) = shutdown_channel();
        request_shutdown(&shutdown_tx);

        let report = tokio::time::timeout(TEST_TIMEOUT, scheduler.start(&shutdown_tx))
            .await
            .map_err(|err| AppError::validation(format!("Early shutdown was lost: {}", err)))?;
        if report.workers_spawned != 2
            || report
                .workers
                .iter()
                .any(|worker| worker.exit != WorkerExit::Cancelled || worker.completed != 0)
        {
            return Err(AppError::validation(format!(
                "Unexpected report {:?}",
                report
            )));
        }
        if issuer.calls.load(Ordering::SeqCst) != 0 {
            return Err(AppError::validation("No request may start after shutdown"));
        }
        if rx.recv().await.is_some() {
            return Err(AppError::validation("Expected closed, empty channel"));
        }
        Ok(())
    })
}

#[test]
fn deadline_abandons_in_flight_request() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer {
            hang: true,
            ..FakeIssuer::default()
        });
        let (tx, mut rx) = mpsc::channel::<Response>(1);
        let scheduler = Scheduler::new(
            by_duration(1, 0, Duration::from_millis(30)),
            vec![endpoint("slow", 100)],
            Requestor::new(issuer, tx),
        )?;
        let (shutdown_tx, _) = shutdown_channel();
        let report = tokio::time::timeout(TEST_TIMEOUT, scheduler.start(&shutdown_tx))
            .await
            .map_err(|err| AppError::validation(format!("Deadline was not enforced: {}", err)))?;
        let worker = report
            .workers
            .first()
            .ok_or_else(|| AppError::validation("Missing worker report"))?;
        if worker.exit != WorkerExit::DeadlineReached || worker.completed != 0 {
            return Err(AppError::validation(format!(
                "Unexpected worker report {:?}",
                worker
            )));
        }
        if rx.recv().await.is_some() {
            return Err(AppError::validation("Abandoned request must not emit"));
        }
        Ok(())
    })
}

#[test]
fn request_error_stops_only_that_worker() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer {
            fail_after: Some(2),
            ..FakeIssuer::default()
        });
        let (tx, mut rx) = mpsc::channel::<Response>(16);
        let scheduler = Scheduler::new(
            by_count(1, 0, 10),
            vec![endpoint("flaky", 100)],
            Requestor::new(Arc::clone(&issuer), tx),
        )?;
        let (shutdown_tx, _) = shutdown_channel();
        let report = tokio::time::timeout(TEST_TIMEOUT, scheduler.start(&shutdown_tx))
            .await
            .map_err(|err| AppError::validation(format!("Scheduler did not finish: {}", err)))?;

        let worker = report
            .workers
            .first()
            .ok_or_else(|| AppError::validation("Missing worker report"))?;
        if worker.exit != WorkerExit::RequestFailed || worker.completed != 2 {
            return Err(AppError::validation(format!(
                "Unexpected worker report {:?}",
                worker
            )));
        }
        let mut emitted = 0_u32;
        while rx.recv().await.is_some() {
            emitted = emitted.saturating_add(1);
        }
        if emitted != 2 || issuer.calls.load(Ordering::SeqCst) != 3 {
            return Err(AppError::validation(format!(
                "Expected 2 responses and 3 attempts, got {} responses",
                emitted
            )));
        }
        Ok(())
    })
}

#[test]
fn endpoint_without_url_is_skipped() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer::default());
        let (tx, _rx) = mpsc::channel::<Response>(1);
        let requestor = Requestor::new(Arc::clone(&issuer), tx);
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let report = requestor
            .process_requests(
                WorkerAssignment {
                    endpoint: Endpoint::new("", HttpMethod::Get, 100),
                    limit: WorkerLimit::Requests(3),
                    rate: 0,
                },
                shutdown_rx,
            )
            .await;
        drop(shutdown_tx);
        if report != WorkerReport::new(0, WorkerExit::Finished) {
            return Err(AppError::validation(format!("Unexpected report {:?}", report)));
        }
        if issuer.calls.load(Ordering::SeqCst) != 0 {
            return Err(AppError::validation("Issuer must not be called"));
        }
        Ok(())
    })
}

#[test]
fn rate_limit_spaces_requests() -> AppResult<()> {
    run_async_test(async {
        let issuer = Arc::new(FakeIssuer::default());
        let (tx, mut rx) = mpsc::channel::<Response>(8);
        let requestor = Requestor::new(issuer, tx);
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let started = tokio::time::Instant::now();
        let report = requestor
            .process_requests(
                WorkerAssignment {
                    endpoint: endpoint("paced", 100),
                    limit: WorkerLimit::Requests(4),
                    rate: 50,
                },
                shutdown_rx,
            )
            .await;
        let elapsed = started.elapsed();
        drop(shutdown_tx);
        drop(requestor);

        if report != WorkerReport::new(4, WorkerExit::Finished) {
            return Err(AppError::validation(format!("Unexpected report {:?}", report)));
        }
        // Three pauses of 20ms separate four requests.
        if elapsed < Duration::from_millis(55) {
            return Err(AppError::validation(format!(
                "Requests were not paced: {:?}",
                elapsed
            )));
        }
        let mut emitted = 0_u32;
        while rx.recv().await.is_some() {
            emitted = emitted.saturating_add(1);
        }
        if emitted != 4 {
            return Err(AppError::validation("Expected 4 responses"));
        }
        Ok(())
    })
}
