use crate::{finalizer, Error, Reason, Report, Result, Store};
use httproute_controller_core::{grant, route, Defaults, Intent, ResourceId};
use httproute_controller_k8s_api::{gateway, OwnerReference, Resource, Service};
use tracing::{debug, info, warn};

/// Keeps a Service's derived HTTPRoute and ReferenceGrant in line with its
/// annotations.
///
/// Callers must not reconcile the same Service concurrently. The reconciler
/// does not retry: an error means the Service should be requeued.
pub struct Reconciler<S, R> {
    store: S,
    reporter: R,
    defaults: Defaults,
}

/// The state a Service was found in, in order of precedence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// The Service is being deleted.
    Deleting,
    /// The Service is not exposed.
    Inactive,
    /// The Service is exposed but its annotations are invalid.
    InvalidConfig,
    /// The Service is exposed.
    Active,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Applied {
    Created,
    Updated,
    Unchanged,
}

// === impl Reconciler ===

impl<S: Store, R: Report> Reconciler<S, R> {
    pub fn new(store: S, reporter: R, defaults: Defaults) -> Self {
        Self {
            store,
            reporter,
            defaults,
        }
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Reconciles a single Service.
    ///
    /// `svc` is the most recently observed state of the Service. The state is
    /// evaluated from scratch on every call.
    pub async fn reconcile(&self, svc: &Service) -> Result<State> {
        let id = ResourceId::of_service(svc).ok_or(Error::Unidentified)?;

        if svc.metadata.deletion_timestamp.is_some() {
            if finalizer::has(svc) {
                debug!("Cleaning up deleted Service");
                self.cleanup(svc, &id).await?;
                self.remove_finalizer(&id).await?;
            }
            return Ok(State::Deleting);
        }

        let intent = match Intent::from_service(svc, &self.defaults) {
            Ok(Some(intent)) => intent,
            Ok(None) => {
                debug!("Service is not exposed");
                self.cleanup(svc, &id).await?;
                if finalizer::has(svc) {
                    self.remove_finalizer(&id).await?;
                }
                return Ok(State::Inactive);
            }
            Err(invalid) => {
                warn!(error = %invalid, "Ignoring Service with invalid annotations");
                self.report(svc, Reason::HttpRouteFailed, invalid.to_string())
                    .await;
                return Ok(State::InvalidConfig);
            }
        };

        self.apply(svc, &id, &intent).await
    }

    async fn apply(&self, svc: &Service, id: &ResourceId, intent: &Intent) -> Result<State> {
        let route_id = route::id(id, &intent.parent.namespace);
        match self.apply_route(id, intent).await {
            Ok(applied) => {
                if applied != Applied::Unchanged {
                    info!(route = %route_id, hostname = %intent.hostname, ?applied, "HTTPRoute applied");
                }
                self.report(
                    svc,
                    Reason::HttpRouteReconciled,
                    format!("HTTPRoute {} in {}", route_id.name, route_id.namespace),
                )
                .await;
            }
            Err(error) => {
                self.report(svc, Reason::HttpRouteFailed, error.to_string())
                    .await;
                return Err(error);
            }
        }

        // A route left behind in a previously annotated gateway namespace
        // would otherwise never be removed.
        self.prune_routes(svc, id, Some(&route_id.namespace))
            .await?;

        if intent.skip_reference_grant {
            debug!("Skipping ReferenceGrant");
            self.report(
                svc,
                Reason::ReferenceGrantSkipped,
                format!("ReferenceGrant {} not managed", grant::name(id)),
            )
            .await;
        } else {
            let owner = owner_ref(svc)?;
            match self
                .apply_grant(id, &intent.parent.namespace, owner)
                .await
            {
                Ok(applied) => {
                    if applied != Applied::Unchanged {
                        info!(grant = %grant::id(id), ?applied, "ReferenceGrant applied");
                    }
                    self.report(
                        svc,
                        Reason::ReferenceGrantReconciled,
                        format!(
                            "ReferenceGrant {} allows HTTPRoutes from {}",
                            grant::name(id),
                            intent.parent.namespace
                        ),
                    )
                    .await;
                }
                Err(error) => {
                    self.report(svc, Reason::ReferenceGrantFailed, error.to_string())
                        .await;
                    return Err(error);
                }
            }
        }

        // The finalizer is written last so that an interrupted reconciliation
        // leaves nothing that the next one cannot redo.
        if !finalizer::has(svc) && !self.add_finalizer(id).await? {
            // The Service went away, or started terminating, after it was
            // observed. Without the finalizer nothing would remove the route.
            debug!("Service deleted before it could be finalized");
            self.cleanup(svc, id).await?;
            return Ok(State::Deleting);
        }
        Ok(State::Active)
    }

    async fn apply_route(&self, id: &ResourceId, intent: &Intent) -> Result<Applied> {
        let desired = route::build(id, intent);
        let route_id = route::id(id, &intent.parent.namespace);

        let Some(mut route) = self.store.get::<gateway::HTTPRoute>(&route_id).await? else {
            self.store.create(&desired).await?;
            return Ok(Applied::Created);
        };

        let labels = route.metadata.labels.get_or_insert_with(Default::default);
        let labeled = route::labels(id)
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v));
        if labeled && covers(&route.spec, &desired.spec) {
            return Ok(Applied::Unchanged);
        }

        // The spec is replaced wholesale so that fields dropped from the
        // desired state are dropped from the route.
        labels.extend(route::labels(id));
        route.spec = desired.spec;
        self.store.replace(&route).await?;
        Ok(Applied::Updated)
    }

    async fn apply_grant(
        &self,
        id: &ResourceId,
        gateway_namespace: &str,
        owner: OwnerReference,
    ) -> Result<Applied> {
        let desired = grant::build(id, gateway_namespace, owner.clone());

        let Some(mut grant) = self
            .store
            .get::<gateway::ReferenceGrant>(&grant::id(id))
            .await?
        else {
            self.store.create(&desired).await?;
            return Ok(Applied::Created);
        };

        let owners = grant.metadata.owner_references.get_or_insert_with(Vec::new);
        let owned = owners.iter().any(|o| *o == owner);
        if owned && covers(&grant.spec, &desired.spec) {
            return Ok(Applied::Unchanged);
        }

        // An object may only have one controller.
        owners.retain(|o| o.uid != owner.uid && o.controller != Some(true));
        owners.push(owner);
        grant.spec = desired.spec;
        self.store.replace(&grant).await?;
        Ok(Applied::Updated)
    }

    /// Returns `false` if the Service no longer exists or is being deleted,
    /// in which case no finalizer may be added.
    async fn add_finalizer(&self, id: &ResourceId) -> Result<bool> {
        // Re-read the Service so the patch is tested against its current
        // finalizers rather than a cached copy.
        let Some(svc) = self.store.get::<Service>(id).await? else {
            return Ok(false);
        };
        if svc.metadata.deletion_timestamp.is_some() {
            return Ok(false);
        }
        if let Some(patch) = finalizer::add(&svc) {
            if self.store.patch::<Service>(id, patch).await?.is_none() {
                return Ok(false);
            }
            debug!("Added finalizer");
        }
        Ok(true)
    }

    async fn remove_finalizer(&self, id: &ResourceId) -> Result<()> {
        let Some(svc) = self.store.get::<Service>(id).await? else {
            return Ok(());
        };
        if let Some(patch) = finalizer::remove(&svc) {
            self.store.patch::<Service>(id, patch).await?;
            debug!("Removed finalizer");
        }
        Ok(())
    }

    pub(crate) async fn report(&self, svc: &Service, reason: Reason, note: String) {
        if let Err(error) = self.reporter.report(svc, reason, note).await {
            warn!(%error, %reason, "Failed to record event");
        }
    }
}

fn owner_ref(svc: &Service) -> Result<OwnerReference> {
    svc.controller_owner_ref(&()).ok_or(Error::Unidentified)
}

/// Checks whether every field set in `desired` holds the same value in
/// `actual`.
///
/// Fields the API server defaults (e.g. a backend's `weight` or a parent's
/// `kind`) are absent from the desired spec and so are ignored. Lists must
/// match in length, so added rules or hostnames are still detected.
fn covers<T: serde::Serialize>(actual: &T, desired: &T) -> bool {
    match (serde_json::to_value(actual), serde_json::to_value(desired)) {
        (Ok(actual), Ok(desired)) => contains(&actual, &desired),
        _ => false,
    }
}

fn contains(actual: &serde_json::Value, desired: &serde_json::Value) -> bool {
    use serde_json::Value;
    match (actual, desired) {
        (Value::Object(actual), Value::Object(desired)) => desired
            .iter()
            .all(|(k, d)| d.is_null() || actual.get(k).is_some_and(|a| contains(a, d))),
        (Value::Array(actual), Value::Array(desired)) => {
            actual.len() == desired.len()
                && actual.iter().zip(desired).all(|(a, d)| contains(a, d))
        }
        (actual, desired) => actual == desired,
    }
}
