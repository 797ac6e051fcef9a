use crate::{
    core::CONTROLLER_NAME,
    k8s::{Client, Resource, Service},
    reconcile::{Reason, Report},
};
use kube::runtime::events::{self, Event, EventType, Reporter};

/// Publishes reconciliation outcomes as Kubernetes Events on the Service.
#[derive(Clone)]
pub struct Recorder(events::Recorder);

impl Recorder {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance: std::env::var("HOSTNAME").ok(),
        };
        Self(events::Recorder::new(client, reporter))
    }
}

#[async_trait::async_trait]
impl Report for Recorder {
    async fn report(&self, svc: &Service, reason: Reason, note: String) -> anyhow::Result<()> {
        self.0.publish(&event(reason, note), &svc.object_ref(&())).await?;
        Ok(())
    }
}

fn event(reason: Reason, note: String) -> Event {
    let action = match reason {
        Reason::HttpRouteReconciled | Reason::ReferenceGrantReconciled => "Apply",
        Reason::HttpRouteDeleted | Reason::ReferenceGrantDeleted => "Delete",
        Reason::HttpRouteFailed | Reason::ReferenceGrantFailed => "Reconcile",
        Reason::ReferenceGrantSkipped => "Skip",
    };
    Event {
        type_: if reason.is_warning() {
            EventType::Warning
        } else {
            EventType::Normal
        },
        reason: reason.to_string(),
        note: Some(note),
        action: action.to_string(),
        secondary: None,
    }
}
