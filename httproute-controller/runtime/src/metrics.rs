use crate::reconcile::{self, State};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{
        counter::Counter,
        family::Family,
        histogram::{exponential_buckets, Histogram},
    },
    registry::{Registry, Unit},
};
use tokio::time::Duration;

#[derive(Clone, Debug)]
pub struct ReconcileMetrics {
    reconciles: Family<StateLabels, Counter>,
    duration: Histogram,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct StateLabels {
    state: &'static str,
}

// === impl ReconcileMetrics ===

impl ReconcileMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reconciles = Family::<StateLabels, Counter>::default();
        reg.register(
            "reconciles",
            "Total number of Service reconciliations by resulting state",
            reconciles.clone(),
        );

        // 10ms to ~20s
        let duration = Histogram::new(exponential_buckets(0.01, 2.0, 12));
        reg.register_with_unit(
            "duration",
            "Histogram of Service reconciliation durations",
            Unit::Seconds,
            duration.clone(),
        );

        Self {
            reconciles,
            duration,
        }
    }

    pub(crate) fn observe(&self, result: &reconcile::Result<State>, elapsed: Duration) {
        let state = match result {
            Ok(State::Active) => "active",
            Ok(State::Inactive) => "inactive",
            Ok(State::InvalidConfig) => "invalid",
            Ok(State::Deleting) => "deleting",
            Err(_) => "error",
        };
        self.reconciles.get_or_create(&StateLabels { state }).inc();
        self.duration.observe(elapsed.as_secs_f64());
    }
}
