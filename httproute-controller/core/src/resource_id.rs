use httproute_controller_k8s_api::{ResourceExt, Service};

#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identifies a Service. Returns `None` for objects that have not been
    /// assigned a namespace and name by the API server.
    pub fn of_service(svc: &Service) -> Option<Self> {
        let namespace = svc.namespace()?;
        let name = svc.metadata.name.clone()?;
        Some(Self { namespace, name })
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
