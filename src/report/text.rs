use std::collections::BTreeMap;
use std::time::Duration;

use crate::metrics::{Histogram, PercentileSet, RunResults};

/// Width of the longest histogram bar.
const BAR_SCALE: u64 = 100;
const BAR_GLYPH: char = '❱';

const PERCENTILE_HEADER: &str = "Min      Median   P75      P90      P95      P99";

/// Human-readable report. Durations are shown in seconds.
#[must_use]
pub fn render_text(results: &RunResults) -> String {
    let mut lines = Vec::new();
    summary_lines(results, &mut lines);
    lines.push(String::new());
    latency_lines(results, &mut lines);
    lines.push(String::new());
    histogram_lines(&results.histogram, &mut lines);
    lines.push(String::new());
    endpoint_lines(results, &mut lines);
    lines.push(String::new());
    network_lines(results, &mut lines);
    lines.join("\n")
}

fn secs(duration: Duration) -> String {
    format!("{:.4}", duration.as_secs_f64())
}

fn percentile_row(set: &PercentileSet) -> String {
    [set.min, set.median, set.p75, set.p90, set.p95, set.p99]
        .into_iter()
        .map(|value| format!("{:<9}", secs(value)))
        .collect::<String>()
        .trim_end()
        .to_owned()
}

fn summary_lines(results: &RunResults, lines: &mut Vec<String>) {
    let summary = &results.summary;
    lines.push("Run Summary:".to_owned());
    lines.push(format!(
        "  Total Requests:  {}",
        summary.request_stats.total_requests
    ));
    lines.push(format!("  Requests/sec:    {:.4}", summary.rate_per_sec));
    lines.push(format!(
        "  Run Duration:    {} secs",
        secs(summary.run_duration)
    ));
    if summary.request_stats.normalized_max_duration > Duration::ZERO {
        lines.push(format!(
            "  Normalized Max:  {} secs",
            secs(summary.request_stats.normalized_max_duration)
        ));
    }
}

fn latency_lines(results: &RunResults, lines: &mut Vec<String>) {
    let stats = &results.summary.request_stats;
    lines.push("Request Latency (secs):".to_owned());
    lines.push(format!("  {:<9}{:<9}{}", "Avg", "Max", PERCENTILE_HEADER));
    lines.push(format!(
        "  {:<9}{:<9}{}",
        secs(stats.avg_duration),
        secs(stats.max_duration),
        percentile_row(&stats.percentiles())
    ));
}

fn histogram_lines(histogram: &Histogram, lines: &mut Vec<String>) {
    lines.push("Request Latency Histogram (secs):".to_owned());
    if histogram.bins.is_empty() {
        lines.push("  no requests completed".to_owned());
        return;
    }
    let widest = histogram
        .iter_bins()
        .map(|bin| bin.count.to_string().len())
        .max()
        .unwrap_or(1);
    for bin in &histogram.bins {
        lines.push(histogram_line(
            bin.upper_bound,
            bin.count,
            histogram.max_bin_count,
            widest,
            "",
        ));
    }
    if let Some(tail) = histogram.tail.as_ref() {
        lines.push(histogram_line(
            tail.upper_bound,
            tail.count,
            histogram.max_bin_count,
            widest,
            " (tail)",
        ));
    }
}

fn histogram_line(bound: Duration, count: u64, max_count: u64, width: usize, label: &str) -> String {
    let bar_len = count
        .saturating_mul(BAR_SCALE)
        .saturating_add(max_count / 2)
        .checked_div(max_count)
        .unwrap_or(0);
    let bar: String = std::iter::repeat_n(BAR_GLYPH, usize::try_from(bar_len).unwrap_or(0)).collect();
    format!(
        "  [{}] {:>width$} {}{}",
        secs(bound),
        count,
        bar,
        label,
        width = width
    )
}

fn endpoint_lines(results: &RunResults, lines: &mut Vec<String>) {
    lines.push("Endpoint Details (secs):".to_owned());
    for (url, detail) in &results.endpoint_details {
        lines.push(format!("  {}", url));
        lines.push(format!("    {:<9}{:<9}{}", "Method", "Count", PERCENTILE_HEADER));
        for (method, stats) in &detail.stats {
            lines.push(format!(
                "    {:<9}{:<9}{}",
                method,
                stats.total_requests,
                percentile_row(&stats.percentiles())
            ));
        }
        for (method, statuses) in &detail.status_distribution {
            lines.push(format!("    {} statuses: {}", method, status_list(statuses)));
        }
    }
}

fn status_list(statuses: &BTreeMap<u16, u64>) -> String {
    statuses
        .iter()
        .map(|(status, count)| format!("{}={}", status, count))
        .collect::<Vec<_>>()
        .join(" ")
}

fn network_lines(results: &RunResults, lines: &mut Vec<String>) {
    let summary = &results.summary;
    lines.push("Network Details (secs):".to_owned());
    lines.push(format!("  {:<16}{:<9}{}", "Timing", "Count", PERCENTILE_HEADER));
    let rows = [
        ("DNS Lookup", &summary.dns_lookup),
        ("TCP Conn Setup", &summary.tcp_connect),
        ("TLS Handshake", &summary.tls_handshake),
        ("Rqst Roundtrip", &summary.round_trip),
    ];
    for (name, timings) in rows {
        if timings.is_empty() {
            lines.push(format!("  {:<16}{:<9}n/a", name, 0));
            continue;
        }
        lines.push(format!(
            "  {:<16}{:<9}{}",
            name,
            timings.len(),
            percentile_row(&PercentileSet::from_sorted(timings))
        ));
    }
}
