//! Command (job) submission, polling and result retrieval

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::http::Connection;
use crate::poll::Poller;
use crate::resource::Resource;
use crate::resources::{ResourceApi, ResourceKind};
use crate::session::Session;
use crate::{Error, Result};

/// Engines a command can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Hive,
    Hadoop,
    Pig,
    Spark,
    Presto,
    Shell,
    DbTapQuery,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        Self::Hive,
        Self::Hadoop,
        Self::Pig,
        Self::Spark,
        Self::Presto,
        Self::Shell,
        Self::DbTapQuery,
    ];

    /// Value of the `command_type` field
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::Hive => "HiveCommand",
            Self::Hadoop => "HadoopCommand",
            Self::Pig => "PigCommand",
            Self::Spark => "SparkCommand",
            Self::Presto => "PrestoCommand",
            Self::Shell => "ShellCommand",
            Self::DbTapQuery => "DbTapQueryCommand",
        }
    }

    /// Body field carrying an inline script
    pub fn script_field(&self) -> &'static str {
        match self {
            Self::Hive | Self::Presto | Self::DbTapQuery => "query",
            Self::Hadoop => "sub_command",
            Self::Pig => "latin_statements",
            Self::Spark => "sql",
            Self::Shell => "inline",
        }
    }

    /// CLI subcommand name (`hivecmd`, ...)
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Hive => "hivecmd",
            Self::Hadoop => "hadoopcmd",
            Self::Pig => "pigcmd",
            Self::Spark => "sparkcmd",
            Self::Presto => "prestocmd",
            Self::Shell => "shellcmd",
            Self::DbTapQuery => "dbtapquerycmd",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_type())
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.cli_name() == needle
                    || kind.command_type().to_lowercase() == needle
                    || kind.cli_name().trim_end_matches("cmd") == needle
            })
            .ok_or_else(|| Error::configuration(format!("Unknown command type '{}'", s)))
    }
}

/// Fields of a command submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRequest {
    /// Inline script, placed in the kind's script field
    pub script: Option<String>,
    /// Location of a script in cloud storage
    pub script_location: Option<String>,
    /// Cluster label to run on
    pub label: Option<String>,
    /// Display name
    pub name: Option<String>,
    pub tags: Vec<String>,
    /// Macro definitions, passed through as given
    pub macros: Option<Value>,
    /// Any further fields, merged last
    pub extra: Map<String, Value>,
}

impl CommandRequest {
    /// Request running an inline script
    pub fn script(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            ..Default::default()
        }
    }

    /// Build the submission body for `kind`
    pub fn into_payload(self, kind: CommandKind) -> Value {
        let mut body = Map::new();

        if let Some(script) = self.script {
            body.insert(kind.script_field().to_string(), Value::String(script));
        }
        if let Some(location) = self.script_location {
            body.insert("script_location".to_string(), Value::String(location));
        }
        if let Some(label) = self.label {
            body.insert("label".to_string(), Value::String(label));
        }
        if let Some(name) = self.name {
            body.insert("name".to_string(), Value::String(name));
        }
        if !self.tags.is_empty() {
            body.insert("tags".to_string(), json!(self.tags));
        }
        if let Some(macros) = self.macros {
            body.insert("macros".to_string(), macros);
        }
        body.extend(self.extra);
        body.insert(
            "command_type".to_string(),
            Value::String(kind.command_type().to_string()),
        );

        Value::Object(body)
    }
}

/// Results of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandResults {
    /// Result rows returned in the response body
    Inline(String),
    /// Result files left in cloud storage
    Location(Vec<String>),
}

impl CommandResults {
    /// Interpret the body of `commands/<id>/results`
    pub fn from_response(response: &Value) -> Result<Self> {
        let inline = response.get("inline").and_then(Value::as_bool).unwrap_or(true);

        if inline {
            let results = match response.get("results") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            return Ok(Self::Inline(results));
        }

        match response.get("result_location") {
            Some(Value::Array(items)) => Ok(Self::Location(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            )),
            Some(Value::String(path)) => Ok(Self::Location(vec![path.clone()])),
            _ => Err(Error::invalid_response(
                "Results are not inline and no result_location was returned",
            )),
        }
    }
}

/// Command wrapper for one engine
#[derive(Debug, Clone)]
pub struct CommandApi {
    kind: CommandKind,
    resources: ResourceApi,
    poller: Poller,
}

impl CommandApi {
    pub fn new(connection: Arc<Connection>, kind: CommandKind, poller: Poller) -> Self {
        Self {
            kind,
            resources: ResourceApi::new(connection, ResourceKind::Command),
            poller,
        }
    }

    /// Wrapper on the session's default connection and poll interval
    pub fn for_session(session: &Session, kind: CommandKind) -> Result<Self> {
        Ok(Self::new(session.agent(None)?, kind, session.poller()))
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn poller(&self) -> Poller {
        self.poller
    }

    /// Submit a command; `command_type` is filled in when absent
    pub async fn submit(&self, payload: &Value) -> Result<Resource> {
        let mut body = match payload {
            Value::Object(map) => map.clone(),
            _ => {
                return Err(Error::invalid_input(
                    "Command payload must be a JSON object",
                ))
            }
        };
        body.entry("command_type")
            .or_insert_with(|| Value::String(self.kind.command_type().to_string()));

        let command = self.resources.create(&Value::Object(body)).await?;
        tracing::info!(
            id = command.id().as_deref().unwrap_or("?"),
            command_type = self.kind.command_type(),
            status = %command.status(),
            "Submitted command"
        );
        Ok(command)
    }

    /// Current state of a command
    pub async fn find(&self, id: &str) -> Result<Resource> {
        self.resources.find(id).await
    }

    /// Submit and wait until the command finishes
    pub async fn run(&self, payload: &Value) -> Result<Resource> {
        self.run_with_progress(payload, |_| {}).await
    }

    /// [`CommandApi::run`], reporting every polled state to `on_poll`
    pub async fn run_with_progress<P>(&self, payload: &Value, on_poll: P) -> Result<Resource>
    where
        P: FnMut(&Resource),
    {
        let submitted = self.submit(payload).await?;
        self.poller
            .wait_for_with_progress(
                submitted,
                move |id| async move { self.find(&id).await },
                on_poll,
            )
            .await
    }

    /// Ask the service to kill a command
    pub async fn cancel(&self, id: &str) -> Result<Value> {
        let payload = json!({"status": "kill"});
        self.resources
            .connection()
            .put(&self.resources.element_path(id), Some(&payload))
            .await
    }

    /// Raw log text of a command
    pub async fn get_log(&self, id: &str) -> Result<String> {
        let path = format!("{}/logs", self.resources.element_path(id));
        self.resources.connection().get_raw(&path, &[]).await
    }

    /// Results of a command; stored results are reported by location
    pub async fn get_results(&self, id: &str) -> Result<CommandResults> {
        let path = format!("{}/results", self.resources.element_path(id));
        let response = self.resources.connection().get(&path, &[]).await?;
        CommandResults::from_response(&response)
    }

    /// Page through command history
    pub async fn list(&self, params: &[(String, String)]) -> Result<Value> {
        self.resources.list(params).await
    }
}
