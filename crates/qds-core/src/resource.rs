//! JSON-backed resource objects
//!
//! The service returns plain JSON objects; a [`Resource`] keeps the object as
//! is and offers typed accessors for the few attributes the client acts on.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A resource as returned by the service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    attributes: Map<String, Value>,
}

impl Resource {
    /// Wrap a decoded response; anything but a JSON object is rejected
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(attributes) => Ok(Self { attributes }),
            other => Err(Error::invalid_response(format!(
                "Expected a JSON object, got: {}",
                other
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String attribute, if present and a string
    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Resource id; the service sends ids as numbers or strings
    pub fn id(&self) -> Option<String> {
        match self.attributes.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Job status; a missing status reads as an unknown, non-terminal one
    pub fn status(&self) -> JobStatus {
        self.str_attr("status")
            .map(JobStatus::parse)
            .unwrap_or_else(|| JobStatus::Other(String::new()))
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.attributes)
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }
}

/// Lifecycle status of a job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Waiting,
    Running,
    Done,
    Error,
    Cancelled,
    /// Any status the client does not act on (`queued`, ...)
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "waiting" => Self::Waiting,
            "running" => Self::Running,
            "done" => Self::Done,
            "error" => Self::Error,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Done, error and cancelled end a job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
