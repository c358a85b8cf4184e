//! Job lifecycle orchestration: payload assembly from a nested source map,
//! submission, and the poll-until-terminal loop.

use std::collections::BTreeMap;

use log::info;
use serde_json::{Map, Value};
use tokio::time::sleep;

use crate::adapters::transport::{Transport, TransportError};
use crate::core::classify::data_uri;
use crate::core::client::ApiClient;
use crate::core::entities::{Job, JobSubmission, Model, Results, SubmissionInput, SubmissionModel};
use crate::core::error::{ClientError, ClientResult};

/// Nested job input: input-group key → parameter name → raw value. File
/// backed values are expected to already be base64 data URIs.
pub type SourceMap = BTreeMap<String, BTreeMap<String, Value>>;

/// Group key used by the single-source convenience helpers.
const DEFAULT_GROUP_KEY: &str = "0001";

/// Progress callback invoked with each non-terminal job snapshot while
/// polling.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(&Job) + Send);

/// Assembles the `input.sources` payload. A multi-row batch is nested under
/// a synthetic `"job"` key so the service can tell it apart from a
/// single-row job; a single group is submitted at the group-map level
/// directly.
pub fn build_sources(groups: &SourceMap) -> Value {
    let mut sources = Map::new();
    for (group, params) in groups {
        let params: Map<String, Value> =
            params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        sources.insert(group.clone(), Value::Object(params));
    }
    if sources.len() > 1 {
        let mut wrapper = Map::new();
        wrapper.insert("job".to_string(), Value::Object(sources));
        Value::Object(wrapper)
    } else {
        Value::Object(sources)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Submits a job against a model version. The version is validated
    /// against the model's known version list before anything goes over the
    /// wire.
    pub async fn run_model(
        &self,
        model: &Model,
        version: &str,
        inputs: &SourceMap,
    ) -> ClientResult<Job> {
        if !model.versions.iter().any(|v| v == version) {
            return Err(ClientError::InvalidVersion {
                model_id: model.model_id.clone(),
                version: version.to_string(),
            });
        }
        let submission = JobSubmission {
            model: SubmissionModel {
                identifier: model.model_id.clone(),
                version: version.to_string(),
            },
            explain: false,
            input: SubmissionInput {
                input_type: "embedded".to_string(),
                sources: build_sources(inputs),
            },
        };
        let job = self.submit_job(&submission).await?;
        info!(
            "Submitted job {} against model {} version {}",
            job.job_identifier, model.model_id, version
        );
        Ok(job)
    }

    async fn run_single_source(
        &self,
        model: &Model,
        version: &str,
        input_name: &str,
        value: String,
    ) -> ClientResult<Job> {
        let mut params = BTreeMap::new();
        params.insert(input_name.to_string(), Value::String(value));
        let mut groups = BTreeMap::new();
        groups.insert(DEFAULT_GROUP_KEY.to_string(), params);
        self.run_model(model, version, &groups).await
    }

    /// One-step submission of a plain-text payload.
    pub async fn run_model_with_text(
        &self,
        model: &Model,
        version: &str,
        input_name: &str,
        text: &str,
    ) -> ClientResult<Job> {
        self.run_single_source(model, version, input_name, data_uri("text/plain", text.as_bytes()))
            .await
    }

    /// One-step submission of a JPEG payload.
    pub async fn run_model_with_jpeg(
        &self,
        model: &Model,
        version: &str,
        input_name: &str,
        data: &[u8],
    ) -> ClientResult<Job> {
        self.run_single_source(model, version, input_name, data_uri("image/jpg", data))
            .await
    }

    /// One-step submission of an MP4 payload.
    pub async fn run_model_with_video(
        &self,
        model: &Model,
        version: &str,
        input_name: &str,
        data: &[u8],
    ) -> ClientResult<Job> {
        self.run_single_source(model, version, input_name, data_uri("video/mp4", data))
            .await
    }

    /// One-step submission of a WAV payload.
    pub async fn run_model_with_wav(
        &self,
        model: &Model,
        version: &str,
        input_name: &str,
        data: &[u8],
    ) -> ClientResult<Job> {
        self.run_single_source(model, version, input_name, data_uri("audio/wav", data))
            .await
    }

    /// Polls a submitted job until it reaches a terminal status, then
    /// fetches its results. `Ok(None)` means the job was canceled or
    /// disappeared server-side; both are valid outcomes, not errors. The
    /// loop has no intrinsic timeout: it ends on a terminal status or when
    /// the context's cancellation token fires, and it re-checks the token
    /// every interval so cancellation is observed promptly.
    pub async fn wait_until_complete(
        &self,
        job: &Job,
        mut progress: Option<ProgressFn<'_>>,
    ) -> ClientResult<Option<Results>> {
        loop {
            if self.context().cancellation.is_cancelled() {
                info!("Canceled while waiting on job {}", job.job_identifier);
                return Ok(None);
            }
            let snapshot = match self.get_job(&job.job_identifier).await {
                Ok(snapshot) => snapshot,
                Err(ClientError::Transport(TransportError::NullResponse { .. })) => {
                    info!("Job {} no longer exists", job.job_identifier);
                    return Ok(None);
                }
                Err(err) => return Err(err),
            };
            match snapshot.status.as_str() {
                "COMPLETED" => {
                    info!("Job {} completed", job.job_identifier);
                    return self.get_results(&job.job_identifier).await.map(Some);
                }
                "CANCELED" => {
                    info!("Job {} canceled", job.job_identifier);
                    return Ok(None);
                }
                _ => {
                    tokio::select! {
                        _ = self.context().cancellation.cancelled() => {
                            info!("Canceled while waiting on job {}", job.job_identifier);
                            return Ok(None);
                        }
                        _ = sleep(self.context().poll_interval) => {}
                    }
                    if let Some(callback) = progress.as_mut() {
                        callback(&snapshot);
                    }
                }
            }
        }
    }
}
