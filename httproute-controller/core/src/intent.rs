use crate::{annotations, Defaults};
use httproute_controller_k8s_api::{ResourceExt, Service};
use std::num::NonZeroU16;
use thiserror::Error;

/// The validated exposure requested by an exposed Service.
///
/// Recomputed on every reconciliation and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    pub hostname: String,
    pub parent: ParentGateway,
    pub port: NonZeroU16,
    pub skip_reference_grant: bool,
}

/// The Gateway listener an HTTPRoute attaches to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentGateway {
    pub name: String,
    pub namespace: String,
    pub section_name: String,
}

/// An exposed Service whose annotations cannot be turned into routing
/// configuration. Retrying does not help; the annotations must change.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidIntent {
    #[error("hostname missing: the {} annotation is required", annotations::HOSTNAME)]
    MissingHostname,

    #[error(
        "no port resolvable: set the {} annotation or declare a port on the Service",
        annotations::PORT
    )]
    NoPort,
}

// === impl Intent ===

impl Intent {
    /// Reads a Service's annotations.
    ///
    /// Returns `Ok(None)` when the Service is not exposed.
    pub fn from_service(svc: &Service, defaults: &Defaults) -> Result<Option<Self>, InvalidIntent> {
        let anns = svc.annotations();
        if !annotations::flag(anns, annotations::EXPOSE) {
            return Ok(None);
        }

        let hostname = annotations::value(anns, annotations::HOSTNAME)
            .ok_or(InvalidIntent::MissingHostname)?
            .to_string();

        let port = annotations::port(anns, annotations::PORT)
            .or_else(|| first_service_port(svc))
            .ok_or(InvalidIntent::NoPort)?;

        let parent = ParentGateway {
            name: annotations::value(anns, annotations::GATEWAY)
                .unwrap_or_else(|| defaults.gateway())
                .to_string(),
            namespace: annotations::gateway_namespace(svc, defaults).to_string(),
            section_name: annotations::value(anns, annotations::SECTION_NAME)
                .unwrap_or_else(|| defaults.section_name())
                .to_string(),
        };

        Ok(Some(Self {
            hostname,
            parent,
            port,
            skip_reference_grant: annotations::flag(anns, annotations::SKIP_REFERENCE_GRANT),
        }))
    }
}

fn first_service_port(svc: &Service) -> Option<NonZeroU16> {
    let port = svc.spec.as_ref()?.ports.as_ref()?.first()?.port;
    u16::try_from(port).ok().and_then(NonZeroU16::new)
}
