use crate::{
    core::ResourceId,
    k8s::{
        self, Api, Client, DeleteParams, ErrorResponse, ListParams, Patch, PatchParams,
        PostParams,
    },
    reconcile::{Error, Object, Result, Store},
};

/// Reads and writes objects through the Kubernetes API.
#[derive(Clone)]
pub struct KubeStore(Client);

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self(client)
    }

    fn api<K: Object>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.0.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl Store for KubeStore {
    async fn get<K: Object>(&self, id: &ResourceId) -> Result<Option<K>> {
        self.api::<K>(&id.namespace)
            .get_opt(&id.name)
            .await
            .map_err(|e| api_error::<K>("get", id, e))
    }

    async fn list<K: Object>(&self, label_selector: &str) -> Result<Vec<K>> {
        let params = ListParams::default().labels(label_selector);
        let list = Api::<K>::all(self.0.clone())
            .list(&params)
            .await
            .map_err(|source| Error::List {
                kind: k8s::kind::<K>(),
                selector: label_selector.to_string(),
                source,
            })?;
        Ok(list.items)
    }

    async fn create<K: Object>(&self, obj: &K) -> Result<K> {
        let id = id_of(obj);
        self.api::<K>(&id.namespace)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| api_error::<K>("create", &id, e))
    }

    async fn replace<K: Object>(&self, obj: &K) -> Result<K> {
        let id = id_of(obj);
        self.api::<K>(&id.namespace)
            .replace(&id.name, &PostParams::default(), obj)
            .await
            .map_err(|e| api_error::<K>("replace", &id, e))
    }

    async fn delete<K: Object>(&self, id: &ResourceId) -> Result<bool> {
        match self
            .api::<K>(&id.namespace)
            .delete(&id.name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(true),
            Err(k8s::Error::Api(ErrorResponse { code: 404, .. })) => Ok(false),
            Err(e) => Err(api_error::<K>("delete", id, e)),
        }
    }

    async fn patch<K: Object>(
        &self,
        id: &ResourceId,
        patch: json_patch::Patch,
    ) -> Result<Option<K>> {
        let patch = Patch::Json::<()>(patch);
        match self
            .api::<K>(&id.namespace)
            .patch(&id.name, &PatchParams::default(), &patch)
            .await
        {
            Ok(obj) => Ok(Some(obj)),
            Err(k8s::Error::Api(ErrorResponse { code: 404, .. })) => Ok(None),
            Err(e) => Err(api_error::<K>("patch", id, e)),
        }
    }
}

fn id_of<K: Object>(obj: &K) -> ResourceId {
    let meta = obj.meta();
    ResourceId::new(
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

/// A failed JSON patch test is reported as unprocessable; like a conflict, it
/// means the object changed since it was read.
fn api_error<K: Object>(verb: &'static str, id: &ResourceId, error: k8s::Error) -> Error {
    let kind = k8s::kind::<K>();
    match error {
        k8s::Error::Api(ErrorResponse { code: 409, .. }) => Error::Conflict {
            kind,
            id: id.clone(),
        },
        k8s::Error::Api(ErrorResponse { code: 422, .. }) if verb == "patch" => Error::Conflict {
            kind,
            id: id.clone(),
        },
        source => Error::Api {
            verb,
            kind,
            id: id.clone(),
            source,
        },
    }
}
