use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::entry::Entry;
use crate::error::ParseError;

/// Statistic selected on the command line. Also selects which checkpoint
/// slot a run reads and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Count,
    Rate,
    Errors,
    Latency,
}

/// Status-class tallies over one scan.
///
/// Parse failures are skipped with a tally, never fatal: a corrupted line
/// must not abort the rest of the scan.
#[derive(Debug, Default)]
pub struct Stats {
    /// Lines skipped by the exclude filter.
    pub excluded: u64,
    /// Lines that failed to parse.
    pub unparsed: u64,
    pub count_200: u64,
    pub count_3xx: u64,
    pub count_4xx: u64,
    pub count_5xx: u64,
    /// Summed response time over status-200 lines.
    pub response_time_sum: f64,
    pub first_time: Option<DateTime<FixedOffset>>,
    pub last_time: Option<DateTime<FixedOffset>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one parse outcome into the tallies.
    pub fn observe(&mut self, outcome: Result<Entry, ParseError>) {
        let entry = match outcome {
            Ok(e) => e,
            Err(err) => {
                self.unparsed += 1;
                debug!(%err, "skipping unparseable line");
                return;
            }
        };

        if self.first_time.is_none() {
            self.first_time = entry.time;
        }
        if entry.time.is_some() {
            self.last_time = entry.time;
        }

        match entry.status {
            200 => {
                self.count_200 += 1;
                self.response_time_sum += entry.response_time;
            }
            300..=399 => self.count_3xx += 1,
            400..=499 => self.count_4xx += 1,
            500..=599 => self.count_5xx += 1,
            _ => {}
        }
    }

    /// Seconds between the first and last parsed timestamps.
    pub fn duration_secs(&self) -> i64 {
        match (self.first_time, self.last_time) {
            (Some(first), Some(last)) => (last - first).num_seconds(),
            _ => 0,
        }
    }

    /// Status-200 requests per second over the scanned window; zero when the
    /// window is empty.
    pub fn rate(&self) -> u64 {
        let duration = self.duration_secs();
        if self.count_200 > 0 && duration > 0 {
            self.count_200 / duration as u64
        } else {
            0
        }
    }

    /// Mean response time over status-200 lines; zero when the window is
    /// empty.
    pub fn avg_response_time(&self) -> f64 {
        if self.count_200 > 0 && self.duration_secs() > 0 {
            self.response_time_sum / self.count_200 as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use anyhow::Result;

    fn line(time: &str, status: u16, response_time: f64) -> String {
        format!(
            r#"127.0.0.1 - - [{time}] "GET / HTTP/1.0" {status} 100 "-" "curl/8.0" {response_time}"#
        )
    }

    #[test]
    fn test_observe_buckets_by_status_class() -> Result<()> {
        let mut stats = Stats::new();
        for status in [200, 200, 301, 404, 500, 503, 100] {
            stats.observe(parse::combined(&line("10/Oct/2000:13:55:36 -0700", status, 0.5)));
        }

        assert_eq!(stats.count_200, 2);
        assert_eq!(stats.count_3xx, 1);
        assert_eq!(stats.count_4xx, 1);
        assert_eq!(stats.count_5xx, 2);
        assert_eq!(stats.response_time_sum, 1.0);
        assert_eq!(stats.unparsed, 0);

        Ok(())
    }

    #[test]
    fn test_parse_errors_are_tallied_and_skipped() {
        let mut stats = Stats::new();
        stats.observe(parse::combined("garbage line"));
        stats.observe(parse::combined(&line("10/Oct/2000:13:55:36 -0700", 200, 0.5)));

        assert_eq!(stats.unparsed, 1);
        assert_eq!(stats.count_200, 1);
    }

    #[test]
    fn test_rate_and_latency_over_time_window() {
        let mut stats = Stats::new();
        stats.observe(parse::combined(&line("10/Oct/2000:13:55:00 -0700", 200, 0.2)));
        stats.observe(parse::combined(&line("10/Oct/2000:13:55:05 -0700", 200, 0.4)));
        stats.observe(parse::combined(&line("10/Oct/2000:13:55:10 -0700", 200, 0.6)));
        stats.observe(parse::combined(&line("10/Oct/2000:13:55:10 -0700", 500, 9.9)));

        assert_eq!(stats.duration_secs(), 10);
        // integer requests-per-second, 3 requests over 10s rounds down
        assert_eq!(stats.rate(), 0);
        assert_eq!(stats.avg_response_time(), (0.2 + 0.4 + 0.6) / 3.0);
        // 5xx latency never enters the sum
        assert_eq!(stats.response_time_sum, 0.2 + 0.4 + 0.6);
    }

    #[test]
    fn test_rate_is_requests_per_second() {
        let mut stats = Stats::new();
        for second in 0..=10 {
            for _ in 0..2 {
                stats.observe(parse::combined(&line(
                    &format!("10/Oct/2000:13:55:{second:02} -0700"),
                    200,
                    0.1,
                )));
            }
        }

        assert_eq!(stats.count_200, 22);
        assert_eq!(stats.duration_secs(), 10);
        assert_eq!(stats.rate(), 2);
    }

    #[test]
    fn test_empty_window_yields_zero_derived_values() {
        let stats = Stats::new();
        assert_eq!(stats.duration_secs(), 0);
        assert_eq!(stats.rate(), 0);
        assert_eq!(stats.avg_response_time(), 0.0);
    }
}
