#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use httproute_controller_core as core;
pub use httproute_controller_k8s_api as k8s;
pub use httproute_controller_k8s_reconcile as reconcile;

mod args;
mod events;
mod metrics;
mod store;

pub use self::{args::Args, events::Recorder, metrics::ReconcileMetrics, store::KubeStore};
