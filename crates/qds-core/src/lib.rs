//! QDS Core - client library for the QDS data-processing REST API
//!
//! This crate submits jobs, manages clusters, schedules and account
//! resources, and waits for asynchronous jobs to finish.
//!
//! # Main Components
//!
//! - **Session**: frozen configuration and cached connection handles
//! - **HTTP transport**: authenticated requests, failure classification,
//!   verb-aware retry with exponential backoff
//! - **Resources**: a generic CRUD wrapper plus typed command, cluster,
//!   scheduler and group wrappers
//! - **Polling**: fixed-interval waiting for job completion
//!
//! # Example
//!
//! ```no_run
//! use qds_core::{CommandApi, CommandKind, CommandRequest, Session, SessionConfig};
//!
//! async fn example() -> qds_core::Result<()> {
//!     let session = Session::configure(SessionConfig::builder("my-api-token").build());
//!     let hive = CommandApi::for_session(&session, CommandKind::Hive)?;
//!
//!     let payload = CommandRequest::script("show tables").into_payload(CommandKind::Hive);
//!     let command = hive.run(&payload).await?;
//!     println!("{} finished: {}", command.id().unwrap_or_default(), command.status());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod poll;
pub mod redaction;
pub mod resource;
pub mod resources;
pub mod session;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use http::{Connection, ErrorClassification, HttpError, RetryOn, RetryPolicy};
pub use poll::Poller;
pub use resource::{JobStatus, Resource};
pub use resources::{
    ClusterApi,
    CommandApi,
    CommandKind,
    CommandRequest,
    CommandResults,
    GroupApi,
    ResourceApi,
    ResourceKind,
    ScheduleApi,
};
pub use session::{CloudName, Session, SessionConfig, SessionConfigBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_configuration_is_checked_before_network() {
        let session = Session::configure(SessionConfig::default());
        let result = CommandApi::for_session(&session, CommandKind::Hive);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
