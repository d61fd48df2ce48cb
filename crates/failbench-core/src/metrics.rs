//! Process-wide counters for benchmark runs.
//!
//! Incremented at the call site; [`Metrics::flush`] emits the current values
//! as one `tracing::info!` event at the end of a batch.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    tasks_executed: AtomicU64,
    failures_detected: AtomicU64,
    agent_errors: AtomicU64,
    queries_degraded: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            tasks_executed: AtomicU64::new(0),
            failures_detected: AtomicU64::new(0),
            agent_errors: AtomicU64::new(0),
            queries_degraded: AtomicU64::new(0),
        }
    }

    pub fn inc_tasks_executed(&self) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tasks_executed", "counter incremented");
    }

    pub fn inc_failures_detected(&self) {
        self.failures_detected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "failures_detected", "counter incremented");
    }

    pub fn inc_agent_errors(&self) {
        self.agent_errors.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agent_errors", "counter incremented");
    }

    pub fn inc_queries_degraded(&self) {
        self.queries_degraded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "queries_degraded", "counter incremented");
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            tasks_executed = self.tasks_executed(),
            failures_detected = self.failures_detected(),
            agent_errors = self.agent_errors(),
            queries_degraded = self.queries_degraded(),
        );
    }

    pub fn tasks_executed(&self) -> u64 {
        self.tasks_executed.load(Ordering::Relaxed)
    }

    pub fn failures_detected(&self) -> u64 {
        self.failures_detected.load(Ordering::Relaxed)
    }

    pub fn agent_errors(&self) -> u64 {
        self.agent_errors.load(Ordering::Relaxed)
    }

    pub fn queries_degraded(&self) -> u64 {
        self.queries_degraded.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn counters_increment_independently() {
        let m = Metrics::new();
        m.inc_tasks_executed();
        m.inc_tasks_executed();
        m.inc_failures_detected();
        m.inc_queries_degraded();

        assert_eq!(m.tasks_executed(), 2);
        assert_eq!(m.failures_detected(), 1);
        assert_eq!(m.agent_errors(), 0);
        assert_eq!(m.queries_degraded(), 1);
    }

    #[traced_test]
    #[test]
    fn every_counter_traces_its_increment() {
        let m = Metrics::new();
        m.inc_tasks_executed();
        m.inc_failures_detected();
        m.inc_agent_errors();
        m.inc_queries_degraded();

        for metric in [
            "tasks_executed",
            "failures_detected",
            "agent_errors",
            "queries_degraded",
        ] {
            assert!(logs_contain(metric), "{metric}");
        }
        assert!(logs_contain("counter incremented"));
    }
}
