use httproute_controller_k8s_api::Service;

/// Outcomes recorded on a Service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reason {
    HttpRouteReconciled,
    HttpRouteFailed,
    HttpRouteDeleted,
    ReferenceGrantReconciled,
    ReferenceGrantFailed,
    ReferenceGrantDeleted,
    ReferenceGrantSkipped,
}

/// Records reconciliation outcomes on a Service.
///
/// Reporting is best-effort: errors are logged by the reconciler and never
/// fail a reconciliation.
#[async_trait::async_trait]
pub trait Report: Send + Sync {
    async fn report(&self, svc: &Service, reason: Reason, note: String) -> anyhow::Result<()>;
}

// === impl Reason ===

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpRouteReconciled => "HTTPRouteReconciled",
            Self::HttpRouteFailed => "HTTPRouteFailed",
            Self::HttpRouteDeleted => "HTTPRouteDeleted",
            Self::ReferenceGrantReconciled => "ReferenceGrantReconciled",
            Self::ReferenceGrantFailed => "ReferenceGrantFailed",
            Self::ReferenceGrantDeleted => "ReferenceGrantDeleted",
            Self::ReferenceGrantSkipped => "ReferenceGrantSkipped",
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::HttpRouteFailed | Self::ReferenceGrantFailed)
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
