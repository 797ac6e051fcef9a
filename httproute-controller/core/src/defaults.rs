use thiserror::Error;

/// Gateway settings applied when a Service does not override them.
///
/// Every value is mandatory; there are no built-in fallbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Defaults {
    gateway: String,
    gateway_namespace: String,
    section_name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefaultsError {
    #[error("a default gateway name must be configured")]
    MissingGateway,

    #[error("a default gateway namespace must be configured")]
    MissingGatewayNamespace,

    #[error("a default gateway listener section name must be configured")]
    MissingSectionName,
}

// === impl Defaults ===

impl Defaults {
    pub fn new(
        gateway: impl Into<String>,
        gateway_namespace: impl Into<String>,
        section_name: impl Into<String>,
    ) -> Result<Self, DefaultsError> {
        let gateway = gateway.into();
        if gateway.trim().is_empty() {
            return Err(DefaultsError::MissingGateway);
        }

        let gateway_namespace = gateway_namespace.into();
        if gateway_namespace.trim().is_empty() {
            return Err(DefaultsError::MissingGatewayNamespace);
        }

        let section_name = section_name.into();
        if section_name.trim().is_empty() {
            return Err(DefaultsError::MissingSectionName);
        }

        Ok(Self {
            gateway,
            gateway_namespace,
            section_name,
        })
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    pub fn gateway_namespace(&self) -> &str {
        &self.gateway_namespace
    }

    pub fn section_name(&self) -> &str {
        &self.section_name
    }
}
