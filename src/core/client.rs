//! The fixed operation set against the service: one request/decode round
//! trip per operation, no retry logic of its own. Anything that polls or
//! orchestrates lives in the runner.

use futures::stream::{self, StreamExt};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adapters::transport::{Transport, TransportError};
use crate::core::context::RunContext;
use crate::core::entities::{
    Job, JobListing, JobSubmission, Model, ModelListing, ModelSampleInput, ModelVersion, Results,
};
use crate::core::error::{ClientError, ClientResult};

/// Bulk listings are fetched in one page.
const PAGE_SIZE: u32 = 1000;

/// Concurrent detail fetches during a bulk listing fan-out.
const DETAIL_FETCH_CONCURRENCY: usize = 10;

pub struct ApiClient<T: Transport> {
    transport: T,
    ctx: RunContext,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, ctx: RunContext) -> Self {
        Self { transport, ctx }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, path: &str) -> ClientResult<R> {
        let body = self.transport.get(path).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    pub(crate) async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        data: &B,
    ) -> ClientResult<R> {
        let body = serde_json::to_vec(data).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })?;
        let response = self.transport.post(path, body).await?;
        serde_json::from_slice(&response).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    pub async fn get_models_listing(&self) -> ClientResult<Vec<ModelListing>> {
        self.get_json(&format!("models?per-page={PAGE_SIZE}")).await
    }

    pub async fn get_model(&self, model_id: &str) -> ClientResult<Model> {
        self.get_json(&format!("models/{model_id}")).await
    }

    pub async fn get_model_versions(&self, model_id: &str) -> ClientResult<Vec<ModelVersion>> {
        self.get_json(&format!("models/{model_id}/versions")).await
    }

    pub async fn get_model_sample_input(
        &self,
        model_id: &str,
        version: &str,
    ) -> ClientResult<ModelSampleInput> {
        self.get_json(&format!("models/{model_id}/versions/{version}/sample-input"))
            .await
    }

    /// Submits a job. A rejected submission surfaces as
    /// [`ClientError::Submission`] carrying the HTTP status; 2xx including
    /// 202 Accepted counts as accepted.
    pub async fn submit_job(&self, submission: &JobSubmission) -> ClientResult<Job> {
        match self.post_json("jobs", submission).await {
            Err(ClientError::Transport(TransportError::Status { status, .. })) => {
                Err(ClientError::Submission(status.to_string()))
            }
            other => other,
        }
    }

    pub async fn get_jobs_listing(&self) -> ClientResult<Vec<JobListing>> {
        self.get_json(&format!("jobs?per-page={PAGE_SIZE}")).await
    }

    pub async fn get_pending_jobs_listing(&self) -> ClientResult<Vec<JobListing>> {
        self.get_json(&format!("jobs/history?status=pending&per-page={PAGE_SIZE}"))
            .await
    }

    pub async fn get_terminated_jobs_listing(&self) -> ClientResult<Vec<JobListing>> {
        self.get_json(&format!("jobs/history?status=terminated&per-page={PAGE_SIZE}"))
            .await
    }

    pub async fn get_job(&self, job_id: &str) -> ClientResult<Job> {
        self.get_json(&format!("jobs/{job_id}")).await
    }

    pub async fn get_results(&self, job_id: &str) -> ClientResult<Results> {
        self.get_json(&format!("results/{job_id}")).await
    }

    /// Bulk listing with one detail fetch per entry, fanned out over a
    /// bounded worker pool. Each worker writes its own pre-sized result
    /// slot, so the returned models are in listing order no matter which
    /// fetch finishes first; `on_each` fires per completed fetch and is the
    /// caller's hook for shared presentation state (progress bars, table
    /// rows), which the caller guards itself.
    pub async fn get_models_with_details<F>(&self, on_each: F) -> ClientResult<Vec<Model>>
    where
        F: Fn(&Model) + Send + Sync,
    {
        let listing = self.get_models_listing().await?;
        info!("Fetching details for {} models", listing.len());

        let mut slots: Vec<Option<Model>> = Vec::new();
        slots.resize_with(listing.len(), || None);

        let on_each = &on_each;
        let fetched: Vec<(usize, ClientResult<Model>)> = stream::iter(listing.iter().enumerate())
            .map(|(slot, entry)| async move {
                let fetched = self.get_model(&entry.model_id).await;
                if let Ok(model) = &fetched {
                    debug!("Fetched model {}", model.model_id);
                    on_each(model);
                }
                (slot, fetched)
            })
            .buffer_unordered(DETAIL_FETCH_CONCURRENCY)
            .collect()
            .await;

        for (slot, fetched) in fetched {
            slots[slot] = Some(fetched?);
        }
        Ok(slots.into_iter().flatten().collect())
    }
}
