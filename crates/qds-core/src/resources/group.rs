//! Group membership

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http::Connection;
use crate::resources::{ResourceApi, ResourceKind};
use crate::session::Session;
use crate::{Error, Result};

/// Group wrapper; CRUD comes from the generic [`ResourceApi`]
#[derive(Debug, Clone)]
pub struct GroupApi {
    resources: ResourceApi,
}

impl GroupApi {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            resources: ResourceApi::new(connection, ResourceKind::Group),
        }
    }

    pub fn for_session(session: &Session) -> Result<Self> {
        Ok(Self::new(session.agent(None)?))
    }

    /// Add users (ids or emails) to a group
    pub async fn add_users(&self, id: &str, users: &[String]) -> Result<Value> {
        self.change_members(id, "add_users", users).await
    }

    /// Remove users (ids or emails) from a group
    pub async fn remove_users(&self, id: &str, users: &[String]) -> Result<Value> {
        self.change_members(id, "remove_users", users).await
    }

    async fn change_members(&self, id: &str, action: &str, users: &[String]) -> Result<Value> {
        if users.is_empty() {
            return Err(Error::invalid_input("At least one user is required"));
        }
        let path = format!("{}/{}", self.resources.element_path(id), action);
        let payload = json!({ "members": users });
        self.resources.connection().put(&path, Some(&payload)).await
    }
}

impl Deref for GroupApi {
    type Target = ResourceApi;

    fn deref(&self) -> &ResourceApi {
        &self.resources
    }
}
