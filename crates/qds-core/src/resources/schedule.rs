//! Scheduled jobs

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http::Connection;
use crate::resources::{ResourceApi, ResourceKind};
use crate::session::Session;
use crate::Result;

/// Scheduler wrapper; CRUD comes from the generic [`ResourceApi`]
#[derive(Debug, Clone)]
pub struct ScheduleApi {
    resources: ResourceApi,
}

impl ScheduleApi {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            resources: ResourceApi::new(connection, ResourceKind::Schedule),
        }
    }

    pub fn for_session(session: &Session) -> Result<Self> {
        Ok(Self::new(session.agent(None)?))
    }

    pub async fn suspend(&self, id: &str) -> Result<Value> {
        self.set_status(id, "suspend").await
    }

    pub async fn resume(&self, id: &str) -> Result<Value> {
        self.set_status(id, "resume").await
    }

    pub async fn kill(&self, id: &str) -> Result<Value> {
        self.set_status(id, "kill").await
    }

    /// Past runs of a schedule
    pub async fn list_instances(&self, id: &str, params: &[(String, String)]) -> Result<Value> {
        let path = format!("{}/instances", self.resources.element_path(id));
        self.resources.connection().get(&path, params).await
    }

    async fn set_status(&self, id: &str, status: &str) -> Result<Value> {
        tracing::info!(schedule = id, status, "Changing schedule status");
        let payload = json!({ "status": status });
        self.resources
            .connection()
            .put(&self.resources.element_path(id), Some(&payload))
            .await
    }
}

impl Deref for ScheduleApi {
    type Target = ResourceApi;

    fn deref(&self) -> &ResourceApi {
        &self.resources
    }
}
