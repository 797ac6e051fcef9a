//! JSON patches that add or remove the controller's finalizer.
//!
//! Each patch first tests the finalizer list it was computed from, so a
//! concurrent change to the list (e.g. another controller's finalizer) makes
//! the patch fail instead of being overwritten. Only the finalizer list is
//! written.

use httproute_controller_core::FINALIZER;
use httproute_controller_k8s_api::{ResourceExt, Service};
use json_patch::{
    jsonptr::PointerBuf, AddOperation, Patch, PatchOperation, RemoveOperation, TestOperation,
};

pub fn has(svc: &Service) -> bool {
    svc.finalizers().iter().any(|f| f == FINALIZER)
}

/// Returns a patch adding the finalizer, or `None` if it is already present.
pub fn add(svc: &Service) -> Option<Patch> {
    if has(svc) {
        return None;
    }

    let finalizers = svc.finalizers();
    let ops = if finalizers.is_empty() {
        vec![
            PatchOperation::Test(TestOperation {
                path: PointerBuf::from_tokens(["metadata", "finalizers"]),
                value: serde_json::Value::Null,
            }),
            PatchOperation::Add(AddOperation {
                path: PointerBuf::from_tokens(["metadata", "finalizers"]),
                value: vec![FINALIZER].into(),
            }),
        ]
    } else {
        vec![
            PatchOperation::Test(TestOperation {
                path: PointerBuf::from_tokens(["metadata", "finalizers"]),
                value: finalizers.into(),
            }),
            PatchOperation::Add(AddOperation {
                path: PointerBuf::from_tokens(["metadata", "finalizers", "-"]),
                value: FINALIZER.into(),
            }),
        ]
    };
    Some(Patch(ops))
}

/// Returns a patch removing the finalizer, or `None` if it is absent.
pub fn remove(svc: &Service) -> Option<Patch> {
    let idx = svc.finalizers().iter().position(|f| f == FINALIZER)?.to_string();
    let path = PointerBuf::from_tokens(["metadata", "finalizers", idx.as_str()]);
    Some(Patch(vec![
        PatchOperation::Test(TestOperation {
            path: path.clone(),
            value: FINALIZER.into(),
        }),
        PatchOperation::Remove(RemoveOperation { path }),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httproute_controller_k8s_api::ObjectMeta;
    use pretty_assertions::assert_eq;

    fn mk_service(finalizers: &[&str]) -> Service {
        Service {
            metadata: ObjectMeta {
                namespace: Some("default".to_string()),
                name: Some("myapp".to_string()),
                finalizers: (!finalizers.is_empty())
                    .then(|| finalizers.iter().map(|f| f.to_string()).collect()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn add_to_empty() {
        let patch = add(&mk_service(&[])).expect("finalizer must be added");
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!([
                { "op": "test", "path": "/metadata/finalizers", "value": null },
                { "op": "add", "path": "/metadata/finalizers", "value": [FINALIZER] },
            ])
        );
    }

    #[test]
    fn add_preserves_other_finalizers() {
        let patch = add(&mk_service(&["example.com/other"])).expect("finalizer must be added");
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!([
                { "op": "test", "path": "/metadata/finalizers", "value": ["example.com/other"] },
                { "op": "add", "path": "/metadata/finalizers/-", "value": FINALIZER },
            ])
        );
    }

    #[test]
    fn add_when_present() {
        assert!(add(&mk_service(&[FINALIZER])).is_none());
    }

    #[test]
    fn remove_by_index() {
        let patch = remove(&mk_service(&["example.com/other", FINALIZER]))
            .expect("finalizer must be removed");
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!([
                { "op": "test", "path": "/metadata/finalizers/1", "value": FINALIZER },
                { "op": "remove", "path": "/metadata/finalizers/1" },
            ])
        );
    }

    #[test]
    fn remove_when_absent() {
        assert!(remove(&mk_service(&["example.com/other"])).is_none());
    }
}
