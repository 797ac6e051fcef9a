//! Builds the HTTPRoute derived from an exposed Service.
//!
//! The route lives in the gateway's namespace, so it cannot be owned by the
//! Service; its lifetime is bound to the Service's finalizer instead.

use crate::{annotations, Intent, ResourceId, CONTROLLER_NAME};
use httproute_controller_k8s_api::gateway;
use std::collections::BTreeMap;

/// Names the HTTPRoute for a Service.
///
/// The Service's namespace is included since routes for Services in
/// different namespaces share the gateway namespace.
pub fn name(service: &ResourceId) -> String {
    format!("{}-{}", service.namespace, service.name)
}

/// Identifies the HTTPRoute for a Service in the given gateway namespace.
pub fn id(service: &ResourceId, gateway_namespace: &str) -> ResourceId {
    ResourceId::new(gateway_namespace, name(service))
}

/// Labels identifying the Service an HTTPRoute was derived from.
pub fn labels(service: &ResourceId) -> BTreeMap<String, String> {
    [
        (annotations::MANAGED_BY_LABEL, CONTROLLER_NAME),
        (annotations::SOURCE_NAMESPACE_LABEL, service.namespace.as_str()),
        (annotations::SOURCE_NAME_LABEL, service.name.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Maps a managed HTTPRoute's labels back to its source Service.
pub fn source(labels: &BTreeMap<String, String>) -> Option<ResourceId> {
    if labels.get(annotations::MANAGED_BY_LABEL).map(String::as_str) != Some(CONTROLLER_NAME) {
        return None;
    }
    let namespace = labels.get(annotations::SOURCE_NAMESPACE_LABEL)?;
    let name = labels.get(annotations::SOURCE_NAME_LABEL)?;
    Some(ResourceId::new(namespace.clone(), name.clone()))
}

/// Builds the desired HTTPRoute.
///
/// Both the parent and backend references name their namespace explicitly,
/// even when it matches the route's own namespace.
pub fn build(service: &ResourceId, intent: &Intent) -> gateway::HTTPRoute {
    let ResourceId { namespace, name } = id(service, &intent.parent.namespace);
    let mut route = gateway::HTTPRoute::new(&name, spec(service, intent));
    route.metadata.namespace = Some(namespace);
    route.metadata.labels = Some(labels(service));
    route
}

pub fn spec(service: &ResourceId, intent: &Intent) -> gateway::HTTPRouteSpec {
    let parent = gateway::HTTPRouteParentRefs {
        name: intent.parent.name.clone(),
        namespace: Some(intent.parent.namespace.clone()),
        section_name: Some(intent.parent.section_name.clone()),
        ..Default::default()
    };

    let backend = gateway::HTTPRouteRulesBackendRefs {
        name: service.name.clone(),
        namespace: Some(service.namespace.clone()),
        port: Some(i32::from(intent.port.get())),
        ..Default::default()
    };

    gateway::HTTPRouteSpec {
        parent_refs: Some(vec![parent]),
        hostnames: Some(vec![intent.hostname.clone()]),
        rules: Some(vec![gateway::HTTPRouteRules {
            backend_refs: Some(vec![backend]),
            ..Default::default()
        }]),
        ..Default::default()
    }
}
