#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use k8s_openapi::{
    api::{
        self,
        core::v1::{ObjectReference, Service, ServicePort, ServiceSpec},
    },
    apimachinery::pkg::apis::meta::v1::{OwnerReference, Time},
    NamespaceResourceScope,
};
pub use kube::{
    api::{
        Api, DeleteParams, ListParams, ObjectMeta, Patch, PatchParams, PostParams, ResourceExt,
    },
    error::ErrorResponse,
    Client, Error, Resource,
};

/// Gateway API resources managed by the controller.
pub mod gateway {
    pub use gateway_api::apis::standard::{
        httproutes::{
            HTTPRoute, HTTPRouteParentRefs, HTTPRouteRules, HTTPRouteRulesBackendRefs,
            HTTPRouteSpec,
        },
        referencegrants::{ReferenceGrant, ReferenceGrantFrom, ReferenceGrantSpec, ReferenceGrantTo},
    };
}

/// Returns the API group of a resource type, which is empty for core types.
pub fn group<T>() -> String
where
    T: Resource,
    T::DynamicType: Default,
{
    T::group(&Default::default()).into_owned()
}

/// Returns the kind of a resource type.
pub fn kind<T>() -> String
where
    T: Resource,
    T::DynamicType: Default,
{
    T::kind(&Default::default()).into_owned()
}

/// Checks whether an owner reference points at the given resource.
pub fn is_owned_by<T>(owner: &OwnerReference, resource: &T) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    owner.kind == T::kind(&dt)
        && owner.api_version == T::api_version(&dt)
        && Some(&owner.name) == resource.meta().name.as_ref()
}
