//! Cluster lifecycle

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http::Connection;
use crate::resources::{ResourceApi, ResourceKind};
use crate::session::Session;
use crate::Result;

/// Cluster wrapper; CRUD comes from the generic [`ResourceApi`]
#[derive(Debug, Clone)]
pub struct ClusterApi {
    resources: ResourceApi,
}

impl ClusterApi {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            resources: ResourceApi::new(connection, ResourceKind::Cluster),
        }
    }

    pub fn for_session(session: &Session) -> Result<Self> {
        Ok(Self::new(session.agent(None)?))
    }

    fn state_path(&self, id: &str) -> String {
        format!("{}/state", self.resources.element_path(id))
    }

    /// Start a cluster by id or label
    pub async fn start(&self, id: &str) -> Result<Value> {
        self.set_state(id, "start").await
    }

    /// Terminate a cluster by id or label
    pub async fn terminate(&self, id: &str) -> Result<Value> {
        self.set_state(id, "terminate").await
    }

    /// Current state (`UP`, `DOWN`, ...)
    pub async fn state(&self, id: &str) -> Result<Value> {
        self.resources
            .connection()
            .get(&self.state_path(id), &[])
            .await
    }

    async fn set_state(&self, id: &str, state: &str) -> Result<Value> {
        tracing::info!(cluster = id, state, "Changing cluster state");
        let payload = json!({ "state": state });
        self.resources
            .connection()
            .put(&self.state_path(id), Some(&payload))
            .await
    }
}

impl Deref for ClusterApi {
    type Target = ResourceApi;

    fn deref(&self) -> &ResourceApi {
        &self.resources
    }
}
