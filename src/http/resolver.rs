use std::cell::Cell;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::trace;

tokio::task_local! {
    /// DNS time spent on behalf of the request running in this task.
    static DNS_LOOKUP: Cell<Option<Duration>>;
}

/// System resolver that reports how long each lookup took to the request
/// that triggered it.
#[derive(Debug, Default)]
pub(super) struct TimedResolver;

impl Resolve for TimedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let started = Instant::now();
            let resolved = tokio::net::lookup_host((name.as_str(), 0)).await?;
            record_dns_lookup(started.elapsed());
            let addrs: Addrs = Box::new(resolved.collect::<Vec<SocketAddr>>().into_iter());
            Ok(addrs)
        })
    }
}

fn record_dns_lookup(elapsed: Duration) {
    if DNS_LOOKUP.try_with(|cell| cell.set(Some(elapsed))).is_err() {
        trace!("DNS lookup finished outside a timed request scope.");
    }
}

/// Runs `future` with a fresh DNS timing slot and returns its output along
/// with the lookup time recorded while it ran.
pub(super) async fn with_dns_timing<F>(future: F) -> (F::Output, Option<Duration>)
where
    F: std::future::Future,
{
    DNS_LOOKUP
        .scope(Cell::new(None), async move {
            let output = future.await;
            let lookup = DNS_LOOKUP.try_with(Cell::take).ok().flatten();
            (output, lookup)
        })
        .await
}
