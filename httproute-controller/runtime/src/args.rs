use crate::{
    core::{annotations, route, Defaults, CONTROLLER_NAME},
    events::Recorder,
    k8s::{gateway, Api, ResourceExt, Service},
    metrics::ReconcileMetrics,
    reconcile::{self, Reconciler, State},
    store::KubeStore,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use kube::runtime::{
    controller::{self, Action, Controller},
    reflector::ObjectRef,
    watcher,
};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, info_span, warn, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "httproute-controller",
    about = "Derives Gateway API HTTPRoutes from annotated Services"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "httproute=info,warn",
        env = "HTTPROUTE_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The Gateway that routes attach to unless a Service overrides it.
    #[clap(long, env = "HTTPROUTE_CONTROLLER_DEFAULT_GATEWAY")]
    default_gateway: String,

    /// The namespace of the default Gateway, where routes are created.
    #[clap(long, env = "HTTPROUTE_CONTROLLER_DEFAULT_GATEWAY_NAMESPACE")]
    default_gateway_namespace: String,

    /// The Gateway listener that routes attach to.
    #[clap(long, env = "HTTPROUTE_CONTROLLER_DEFAULT_SECTION_NAME")]
    default_section_name: String,

    /// The maximum number of Services reconciled at once.
    #[clap(long, default_value = "4")]
    concurrency: u16,

    #[clap(long, default_value = "10000")]
    reconcile_timeout_ms: u64,

    #[clap(long, default_value = "5000")]
    requeue_backoff_ms: u64,
}

struct Context {
    reconciler: Reconciler<KubeStore, Recorder>,
    metrics: ReconcileMetrics,
    timeout: Duration,
    backoff: Duration,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            default_gateway,
            default_gateway_namespace,
            default_section_name,
            concurrency,
            reconcile_timeout_ms,
            requeue_backoff_ms,
        } = self;

        let defaults = Defaults::new(
            default_gateway,
            default_gateway_namespace,
            default_section_name,
        )?;

        let mut prom = <Registry>::default();
        let metrics = ReconcileMetrics::register(prom.sub_registry_with_prefix("reconcile"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        info!(
            gateway = %defaults.gateway(),
            namespace = %defaults.gateway_namespace(),
            section = %defaults.section_name(),
            "Using default Gateway"
        );

        let client = runtime.client();
        let ctx = Arc::new(Context {
            reconciler: Reconciler::new(
                KubeStore::new(client.clone()),
                Recorder::new(client.clone()),
                defaults,
            ),
            metrics,
            timeout: Duration::from_millis(reconcile_timeout_ms),
            backoff: Duration::from_millis(requeue_backoff_ms),
        });

        // Derived routes live in other namespaces and cannot be owned by the
        // Service, so they are mapped back through their source labels.
        let managed = format!("{}={CONTROLLER_NAME}", annotations::MANAGED_BY_LABEL);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let controller = Controller::new(
            Api::<Service>::all(client.clone()),
            watcher::Config::default(),
        )
        .owns(
            Api::<gateway::ReferenceGrant>::all(client.clone()),
            watcher::Config::default(),
        )
        .watches(
            Api::<gateway::HTTPRoute>::all(client),
            watcher::Config::default().labels(&managed),
            |route| {
                let id = route::source(route.labels())?;
                Some(ObjectRef::<Service>::new(&id.name).within(&id.namespace))
            },
        )
        .with_config(controller::Config::default().concurrency(concurrency))
        .graceful_shutdown_on(async move {
            let _ = stop_rx.await;
        })
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(service = %obj, "Reconciled"),
                // Already logged by the error policy.
                Err(controller::Error::ReconcilerFailed(..)) => {}
                Err(error) => warn!(%error, "Controller error"),
            }
        });

        // Once shutdown is signaled, stop accepting new work and wait for
        // in-flight reconciliations before releasing the runtime.
        let shutdown = runtime.shutdown_handle();
        tokio::spawn(
            async move {
                tokio::pin!(controller);
                tokio::select! {
                    _ = &mut controller => {}
                    release = shutdown.signaled() => {
                        let _ = stop_tx.send(());
                        release.release_after(controller).await;
                    }
                }
            }
            .instrument(info_span!("services")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

async fn reconcile(svc: Arc<Service>, ctx: Arc<Context>) -> reconcile::Result<Action> {
    let span = info_span!(
        "reconcile",
        ns = %svc.namespace().unwrap_or_default(),
        name = %svc.name_any(),
    );
    let start = time::Instant::now();
    let result = bounded(ctx.timeout, ctx.reconciler.reconcile(&svc))
        .instrument(span.clone())
        .await;
    ctx.metrics.observe(&result, start.elapsed());

    let state = result?;
    span.in_scope(|| debug!(?state, "Reconciled Service"));
    Ok(Action::await_change())
}

/// Fails a reconciliation that has not completed within `timeout`.
async fn bounded<F>(timeout: Duration, reconciliation: F) -> reconcile::Result<State>
where
    F: Future<Output = reconcile::Result<State>>,
{
    time::timeout(timeout, reconciliation)
        .await
        .unwrap_or(Err(reconcile::Error::Timeout(timeout)))
}

fn error_policy(svc: Arc<Service>, error: &reconcile::Error, ctx: Arc<Context>) -> Action {
    requeue(&svc, error, ctx.backoff)
}

fn requeue(svc: &Service, error: &reconcile::Error, backoff: Duration) -> Action {
    let ns = svc.namespace().unwrap_or_default();
    let name = svc.name_any();
    if error.is_conflict() {
        info!(%ns, %name, %error, "Service changed during reconciliation; requeueing");
    } else {
        error!(%ns, %name, %error, "Failed to reconcile Service; requeueing");
    }
    Action::requeue(backoff)
}
