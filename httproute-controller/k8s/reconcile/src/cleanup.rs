use crate::{finalizer, Reason, Reconciler, Report, Result, Store};
use httproute_controller_core::{annotations, grant, route, ResourceId};
use httproute_controller_k8s_api::{self as k8s, gateway, ResourceExt, Service};
use tracing::{debug, info};

impl<S: Store, R: Report> Reconciler<S, R> {
    /// Deletes the resources derived from a Service.
    ///
    /// Resources that do not exist are ignored, so cleanup is idempotent.
    pub(crate) async fn cleanup(&self, svc: &Service, id: &ResourceId) -> Result<()> {
        // The route was created in the annotated namespace, or in the default
        // namespace when the annotation was unset.
        let namespace = annotations::gateway_namespace(svc, self.defaults());
        let route_id = route::id(id, namespace);
        if self.store().delete::<gateway::HTTPRoute>(&route_id).await? {
            info!(route = %route_id, "Deleted HTTPRoute");
            self.report(
                svc,
                Reason::HttpRouteDeleted,
                format!("HTTPRoute {} in {}", route_id.name, route_id.namespace),
            )
            .await;
        }
        // Stale routes are only pruned for Services carrying the finalizer so
        // that unexposed Services do not each list routes cluster-wide.
        if finalizer::has(svc) {
            self.prune_routes(svc, id, None).await?;
        }

        // Only a grant controlled by this Service is removed; a grant with the
        // same name that was created by someone else is left alone.
        let grant_id = grant::id(id);
        if let Some(grant) = self
            .store()
            .get::<gateway::ReferenceGrant>(&grant_id)
            .await?
        {
            let owned = grant
                .owner_references()
                .iter()
                .any(|o| o.controller == Some(true) && k8s::is_owned_by(o, svc));
            if !owned {
                debug!(grant = %grant_id, "Leaving unowned ReferenceGrant");
            } else if self
                .store()
                .delete::<gateway::ReferenceGrant>(&grant_id)
                .await?
            {
                info!(grant = %grant_id, "Deleted ReferenceGrant");
                self.report(
                    svc,
                    Reason::ReferenceGrantDeleted,
                    format!("ReferenceGrant {}", grant_id.name),
                )
                .await;
            }
        }

        Ok(())
    }

    /// Deletes managed HTTPRoutes for a Service outside of `keep_namespace`.
    ///
    /// Routes are found by their source labels, which covers routes left in a
    /// gateway namespace that is no longer annotated on the Service.
    pub(crate) async fn prune_routes(
        &self,
        svc: &Service,
        id: &ResourceId,
        keep_namespace: Option<&str>,
    ) -> Result<()> {
        let selector = route::labels(id)
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        let expected = route::name(id);
        for stale in self.store().list::<gateway::HTTPRoute>(&selector).await? {
            let Some(namespace) = stale.namespace() else {
                continue;
            };
            if Some(namespace.as_str()) == keep_namespace || stale.name_any() != expected {
                continue;
            }
            let stale_id = ResourceId::new(namespace, stale.name_any());
            if self.store().delete::<gateway::HTTPRoute>(&stale_id).await? {
                info!(route = %stale_id, "Deleted stale HTTPRoute");
                self.report(
                    svc,
                    Reason::HttpRouteDeleted,
                    format!("HTTPRoute {} in {}", stale_id.name, stale_id.namespace),
                )
                .await;
            }
        }
        Ok(())
    }
}
