//! Prometheus metrics for state transition.

use std::sync::LazyLock;
use std::time::Instant;

use prometheus::{
    Histogram, IntCounter, register_histogram, register_int_counter,
};

static SLOTS_PROCESSED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "ethlean_state_transition_slots_processed_total",
        "Count of processed slots"
    )
    .unwrap()
});

static ATTESTATIONS_PROCESSED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "ethlean_state_transition_attestations_processed_total",
        "Count of processed attestations"
    )
    .unwrap()
});

static JUSTIFICATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "ethlean_justifications_total",
        "Count of checkpoints justified by attestation processing"
    )
    .unwrap()
});

static FINALIZATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "ethlean_finalizations_total",
        "Count of checkpoints finalized by attestation processing"
    )
    .unwrap()
});

/// Increment the slots processed counter by the given amount.
pub fn inc_slots_processed(count: u64) {
    SLOTS_PROCESSED_TOTAL.inc_by(count);
}

/// Increment the attestations processed counter by the given amount.
pub fn inc_attestations_processed(count: u64) {
    ATTESTATIONS_PROCESSED_TOTAL.inc_by(count);
}

pub fn inc_justifications() {
    JUSTIFICATIONS_TOTAL.inc();
}

pub fn inc_finalizations() {
    FINALIZATIONS_TOTAL.inc();
}

static STATE_TRANSITION_TIME_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "ethlean_state_transition_time_seconds",
        "Duration of the entire state transition",
        vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 2.5, 3.0, 4.0]
    )
    .unwrap()
});

static SLOTS_PROCESSING_TIME_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "ethlean_state_transition_slots_processing_time_seconds",
        "Duration to process slots",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 1.0]
    )
    .unwrap()
});

static BLOCK_PROCESSING_TIME_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "ethlean_state_transition_block_processing_time_seconds",
        "Duration to process a block in state transition",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 1.0]
    )
    .unwrap()
});

static ATTESTATIONS_PROCESSING_TIME_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "ethlean_state_transition_attestations_processing_time_seconds",
        "Duration to process attestations",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 1.0]
    )
    .unwrap()
});

/// A guard that records elapsed time to a histogram when dropped.
pub struct TimingGuard {
    histogram: &'static Histogram,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

fn start_timing(histogram: &'static Histogram) -> TimingGuard {
    TimingGuard {
        histogram,
        start: Instant::now(),
    }
}

/// Start timing a full state transition. Records the duration when dropped.
pub fn time_state_transition() -> TimingGuard {
    start_timing(&STATE_TRANSITION_TIME_SECONDS)
}

pub fn time_slots_processing() -> TimingGuard {
    start_timing(&SLOTS_PROCESSING_TIME_SECONDS)
}

pub fn time_block_processing() -> TimingGuard {
    start_timing(&BLOCK_PROCESSING_TIME_SECONDS)
}

pub fn time_attestations_processing() -> TimingGuard {
    start_timing(&ATTESTATIONS_PROCESSING_TIME_SECONDS)
}
