//! Builds the ReferenceGrant that lets an HTTPRoute in the gateway namespace
//! reference a Service in another namespace.
//!
//! The grant lives beside the Service and is owned by it, so the API server
//! garbage-collects it when the Service is deleted.

use crate::ResourceId;
use httproute_controller_k8s_api::{self as k8s, gateway, OwnerReference, Service};

/// Names the ReferenceGrant for a Service.
pub fn name(service: &ResourceId) -> String {
    format!("{}-backend", service.name)
}

/// Identifies the ReferenceGrant for a Service.
pub fn id(service: &ResourceId) -> ResourceId {
    ResourceId::new(service.namespace.clone(), name(service))
}

/// Builds the desired ReferenceGrant, owned by `owner`.
pub fn build(
    service: &ResourceId,
    gateway_namespace: &str,
    owner: OwnerReference,
) -> gateway::ReferenceGrant {
    let ResourceId { namespace, name } = id(service);
    let mut grant = gateway::ReferenceGrant::new(&name, spec(service, gateway_namespace));
    grant.metadata.namespace = Some(namespace);
    grant.metadata.owner_references = Some(vec![owner]);
    grant
}

pub fn spec(service: &ResourceId, gateway_namespace: &str) -> gateway::ReferenceGrantSpec {
    gateway::ReferenceGrantSpec {
        from: vec![gateway::ReferenceGrantFrom {
            group: k8s::group::<gateway::HTTPRoute>(),
            kind: k8s::kind::<gateway::HTTPRoute>(),
            namespace: gateway_namespace.to_string(),
        }],
        to: vec![gateway::ReferenceGrantTo {
            group: k8s::group::<Service>(),
            kind: k8s::kind::<Service>(),
            name: Some(service.name.clone()),
        }],
    }
}
