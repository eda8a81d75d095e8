//! Resource wrappers over the REST API
//!
//! [`ResourceApi`] is the one generic CRUD wrapper; the kind it is bound to
//! decides the URL path. Resources with extra actions (commands, clusters,
//! schedules, groups) get a typed wrapper that derefs to the generic one.

pub mod cluster;
pub mod command;
pub mod group;
pub mod schedule;

pub use cluster::ClusterApi;
pub use command::{CommandApi, CommandKind, CommandRequest, CommandResults};
pub use group::GroupApi;
pub use schedule::ScheduleApi;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::http::Connection;
use crate::resource::Resource;
use crate::session::Session;
use crate::{Error, Result};

/// Kinds of resources the service exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Command,
    Cluster,
    Schedule,
    User,
    Group,
    Role,
    Account,
    Bucket,
    DbTap,
    Pipeline,
    Report,
}

/// (kind, CLI name, URL path segment)
const KIND_TABLE: &[(ResourceKind, &str, &str)] = &[
    (ResourceKind::Command, "command", "commands"),
    (ResourceKind::Cluster, "cluster", "clusters"),
    (ResourceKind::Schedule, "scheduler", "scheduler"),
    (ResourceKind::User, "user", "users"),
    (ResourceKind::Group, "group", "groups"),
    (ResourceKind::Role, "role", "roles"),
    (ResourceKind::Account, "account", "account"),
    (ResourceKind::Bucket, "bucket", "buckets"),
    (ResourceKind::DbTap, "dbtap", "db_taps"),
    (ResourceKind::Pipeline, "pipeline", "pipelines"),
    (ResourceKind::Report, "report", "reports"),
];

impl ResourceKind {
    /// Every kind, in table order
    pub const ALL: [ResourceKind; 11] = [
        Self::Command,
        Self::Cluster,
        Self::Schedule,
        Self::User,
        Self::Group,
        Self::Role,
        Self::Account,
        Self::Bucket,
        Self::DbTap,
        Self::Pipeline,
        Self::Report,
    ];

    // rows are in declaration order
    fn entry(&self) -> &'static (ResourceKind, &'static str, &'static str) {
        &KIND_TABLE[*self as usize]
    }

    /// Name used on the command line
    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    /// Collection path relative to the versioned API root
    pub fn path(&self) -> &'static str {
        self.entry().2
    }

    /// Look a kind up by CLI name or path segment
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        KIND_TABLE
            .iter()
            .find(|(_, cli, path)| *cli == name || *path == name)
            .map(|(kind, _, _)| *kind)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::configuration(format!("Unknown resource kind '{}'", s)))
    }
}

/// Generic CRUD wrapper bound to one resource kind
#[derive(Debug, Clone)]
pub struct ResourceApi {
    kind: ResourceKind,
    connection: Arc<Connection>,
}

impl ResourceApi {
    pub fn new(connection: Arc<Connection>, kind: ResourceKind) -> Self {
        Self { kind, connection }
    }

    /// Wrapper on the session's default connection
    pub fn for_session(session: &Session, kind: ResourceKind) -> Result<Self> {
        Ok(Self::new(session.agent(None)?, kind))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Path of one element of the collection
    pub fn element_path(&self, id: &str) -> String {
        format!("{}/{}", self.kind.path(), id)
    }

    /// POST a new resource
    pub async fn create(&self, payload: &Value) -> Result<Resource> {
        let response = self.connection.post(self.kind.path(), Some(payload)).await?;
        Resource::from_value(response)
    }

    /// GET one resource by id
    pub async fn find(&self, id: &str) -> Result<Resource> {
        let response = self.connection.get(&self.element_path(id), &[]).await?;
        Resource::from_value(response)
    }

    /// GET the collection; the listing envelope varies by kind, so it is returned as is
    pub async fn list(&self, params: &[(String, String)]) -> Result<Value> {
        self.connection.get(self.kind.path(), params).await
    }

    /// PUT changed attributes of one resource
    pub async fn update(&self, id: &str, payload: &Value) -> Result<Resource> {
        let response = self
            .connection
            .put(&self.element_path(id), Some(payload))
            .await?;
        Resource::from_value(response)
    }

    /// DELETE one resource
    pub async fn delete(&self, id: &str) -> Result<Value> {
        self.connection.delete(&self.element_path(id), None).await
    }
}
