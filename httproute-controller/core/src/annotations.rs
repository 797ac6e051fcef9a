//! Annotations recognized on Services.
//!
//! The `httproute.controller` prefix is fixed and is not configurable at
//! runtime.

use crate::Defaults;
use httproute_controller_k8s_api::{ResourceExt, Service};
use std::{collections::BTreeMap, num::NonZeroU16};

pub const EXPOSE: &str = "httproute.controller/expose";
pub const HOSTNAME: &str = "httproute.controller/hostname";
pub const GATEWAY: &str = "httproute.controller/gateway";
pub const GATEWAY_NAMESPACE: &str = "httproute.controller/gateway-namespace";
pub const SECTION_NAME: &str = "httproute.controller/section-name";
pub const PORT: &str = "httproute.controller/port";
pub const SKIP_REFERENCE_GRANT: &str = "httproute.controller/skip-reference-grant";

/// Labels placed on derived HTTPRoutes so they can be mapped back to their
/// source Service.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const SOURCE_NAMESPACE_LABEL: &str = "httproute.controller/source-namespace";
pub const SOURCE_NAME_LABEL: &str = "httproute.controller/source-name";

const TRUE: &str = "true";

/// Only the literal `true` enables a flag.
pub(crate) fn flag(annotations: &BTreeMap<String, String>, key: &str) -> bool {
    annotations.get(key).map(String::as_str) == Some(TRUE)
}

/// Reads an annotation, treating an empty value as unset.
pub(crate) fn value<'a>(annotations: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    annotations
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Reads `annotation`, parsing it as a port number. If the annotation is not
/// set or is invalid, `None` is returned.
pub(crate) fn port(annotations: &BTreeMap<String, String>, annotation: &str) -> Option<NonZeroU16> {
    let spec = value(annotations, annotation)?;
    match spec.parse::<NonZeroU16>() {
        Ok(port) => Some(port),
        Err(error) => {
            tracing::info!(%spec, %error, %annotation, "Invalid port");
            None
        }
    }
}

/// Resolves the namespace holding a Service's HTTPRoute.
///
/// Used on both the apply and cleanup paths so that cleanup finds a route
/// created under the default namespace after the annotation is removed.
pub fn gateway_namespace<'a>(svc: &'a Service, defaults: &'a Defaults) -> &'a str {
    value(svc.annotations(), GATEWAY_NAMESPACE).unwrap_or_else(|| defaults.gateway_namespace())
}
