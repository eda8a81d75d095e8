//! Waiting for asynchronous jobs to finish
//!
//! Polling is unbounded: a job that never reaches a terminal status keeps the
//! caller waiting. Each poll sleeps the full interval before fetching.

use std::future::Future;
use std::time::Duration;

use crate::resource::Resource;
use crate::{Error, Result};

/// Fixed-interval job poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Re-fetch `initial` by id until its status is terminal
    pub async fn wait_for<F, Fut>(&self, initial: Resource, fetch: F) -> Result<Resource>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Resource>>,
    {
        self.wait_for_with_progress(initial, fetch, |_| {}).await
    }

    /// Like [`Poller::wait_for`], calling `on_poll` with every fetched resource
    pub async fn wait_for_with_progress<F, Fut, P>(
        &self,
        initial: Resource,
        mut fetch: F,
        mut on_poll: P,
    ) -> Result<Resource>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Resource>>,
        P: FnMut(&Resource),
    {
        require_status(&initial)?;
        if initial.status().is_terminal() {
            return Ok(initial);
        }

        let id = initial
            .id()
            .ok_or_else(|| Error::invalid_response("Submitted job has no id to poll"))?;

        let mut current = initial;
        let mut polls: u64 = 0;

        while !current.status().is_terminal() {
            tracing::debug!(
                id = %id,
                status = %current.status(),
                polls,
                interval_secs = self.interval.as_secs_f64(),
                "Job not finished, waiting"
            );
            tokio::time::sleep(self.interval).await;
            current = fetch(id.clone()).await?;
            polls += 1;
            require_status(&current)?;
            on_poll(&current);
        }

        tracing::info!(id = %id, status = %current.status(), polls, "Job finished");
        Ok(current)
    }
}

/// A job without a status would never read as terminal
fn require_status(resource: &Resource) -> Result<()> {
    if resource.str_attr("status").is_some() {
        return Ok(());
    }
    Err(Error::invalid_response(format!(
        "Job {} has no status",
        resource.id().as_deref().unwrap_or("?")
    )))
}
