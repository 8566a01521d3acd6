//! Process-wide atomic counters.
//!
//! Counters are incremented silently at the call site. [`Metrics::flush`]
//! emits current values as one `tracing::info!` event, typically at the end
//! of a run.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    role_steps: AtomicU64,
    parser_fallbacks: AtomicU64,
    research_failures: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            role_steps: AtomicU64::new(0),
            parser_fallbacks: AtomicU64::new(0),
            research_failures: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
        }
    }

    pub fn inc_role_steps(&self) {
        self.role_steps.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "role_steps", "counter incremented");
    }

    pub fn inc_parser_fallbacks(&self) {
        self.parser_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "parser_fallbacks", "counter incremented");
    }

    pub fn inc_research_failures(&self) {
        self.research_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "research_failures", "counter incremented");
    }

    pub fn inc_runs_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_completed", "counter incremented");
    }

    pub fn inc_runs_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_failed", "counter incremented");
    }

    /// Emit all counters as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            role_steps = self.role_steps(),
            parser_fallbacks = self.parser_fallbacks(),
            research_failures = self.research_failures(),
            runs_completed = self.runs_completed(),
            runs_failed = self.runs_failed(),
        );
    }

    pub fn role_steps(&self) -> u64 {
        self.role_steps.load(Ordering::Relaxed)
    }

    pub fn parser_fallbacks(&self) -> u64 {
        self.parser_fallbacks.load(Ordering::Relaxed)
    }

    pub fn research_failures(&self) -> u64 {
        self.research_failures.load(Ordering::Relaxed)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    /// Zero every counter (tests).
    pub fn reset(&self) {
        for counter in [
            &self.role_steps,
            &self.parser_fallbacks,
            &self.research_failures,
            &self.runs_completed,
            &self.runs_failed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let m = Metrics::new();
        m.inc_role_steps();
        m.inc_role_steps();
        m.inc_parser_fallbacks();
        m.inc_runs_failed();
        assert_eq!(m.role_steps(), 2);
        assert_eq!(m.parser_fallbacks(), 1);
        assert_eq!(m.research_failures(), 0);
        assert_eq!(m.runs_completed(), 0);
        assert_eq!(m.runs_failed(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_role_steps();
        m.inc_research_failures();
        m.inc_runs_completed();
        m.reset();
        assert_eq!(m.role_steps(), 0);
        assert_eq!(m.research_failures(), 0);
        assert_eq!(m.runs_completed(), 0);
    }
}
