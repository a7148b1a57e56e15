use std::{sync::Arc, time::Duration};

use arena_model::{Submission, WorkItem};
use async_trait::async_trait;
use tracing::debug;

use crate::QueueError;

/// Remote source of work items and sink for their results.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Fetch a fresh work item. Items are never reused between games.
    async fn fetch(&self) -> Result<WorkItem, QueueError>;

    async fn submit(&self, submission: &Submission) -> Result<(), QueueError>;
}

#[async_trait]
impl<T: Collector> Collector for Arc<T> {
    async fn fetch(&self) -> Result<WorkItem, QueueError> {
        (**self).fetch().await
    }

    async fn submit(&self, submission: &Submission) -> Result<(), QueueError> {
        (**self).submit(submission).await
    }
}

/// Collector reached over HTTP: `GET /api/getwork`, `POST /api/submit`.
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCollector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, QueueError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn getwork_url(&self) -> String {
        format!("{}/api/getwork", self.endpoint)
    }

    pub fn submit_url(&self) -> String {
        format!("{}/api/submit", self.endpoint)
    }
}

async fn accepted(response: reqwest::Response) -> Result<String, QueueError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(QueueError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[async_trait]
impl Collector for HttpCollector {
    async fn fetch(&self) -> Result<WorkItem, QueueError> {
        let response = self.client.get(self.getwork_url()).send().await?;
        let body = accepted(response).await?;
        if body.trim().is_empty() {
            return Err(QueueError::NoWork);
        }
        let item = WorkItem::parse(&body)?;
        debug!(
            target: "arena.queue.collector",
            baseline = %item.baseline.id,
            player = %item.player.id,
            size = %item.size.id,
            time = %item.time.id,
            "work item fetched"
        );
        Ok(item)
    }

    async fn submit(&self, submission: &Submission) -> Result<(), QueueError> {
        let response = self.client.post(self.submit_url()).form(submission).send().await?;
        accepted(response).await?;
        debug!(target: "arena.queue.collector", outcome = submission.outcome, "result submitted");
        Ok(())
    }
}
