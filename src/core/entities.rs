//! Typed records for the service's wire entities. All of them are plain
//! value types owned by the caller after decode; none hold a reference back
//! to the client that fetched them. Field names follow the wire's camelCase,
//! and fields the service omits on some responses carry serde defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::codec::{JobInputs, ResultsJson, SourceValue};

/// A deployed model as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub model_id: String,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub latest_active_version: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub features: Vec<Value>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub is_commercial: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub images: Vec<ModelImage>,
    #[serde(default)]
    pub snapshot_images: Vec<Value>,
    pub last_active_date_time: Option<DateTime<Utc>>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub is_categorical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelImage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub relation_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visibility {
    #[serde(default)]
    pub scope: String,
}

/// Lightweight projection of a model used by the bulk listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListing {
    pub model_id: String,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

/// One entry of the versions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    pub version: String,
}

/// The model reference embedded in jobs and job listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobModel {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub identifier: String,
}

/// One submitted execution request. The identifier is an opaque string;
/// older service versions reported a strict UUID but the contract never
/// promised one. The status vocabulary is open-ended and reported verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_identifier: String,
    #[serde(default)]
    pub model: JobModel,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_inputs: i64,
    #[serde(default)]
    pub explain: bool,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub account_identifier: String,
    #[serde(default)]
    pub team: Team,
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hours_delete_input: i64,
    #[serde(default)]
    pub image_classification_model: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_inputs: Option<JobInputs>,
}

/// Projection of a job used for bulk enumeration and history buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub job_identifier: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub model: JobModel,
}

/// Aggregate accounting for a job plus the per-input outcome maps. The
/// `finished` flag is server-reported and round-tripped as-is; once it is
/// true every declared input appears in exactly one of `results` or
/// `failures`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    pub job_identifier: String,
    #[serde(default)]
    pub account_identifier: String,
    #[serde(default)]
    pub team: Team,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub completed: i64,
    #[serde(default)]
    pub failed: i64,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub submitted_by_key: String,
    #[serde(default)]
    pub explained: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub initial_queue_time: i64,
    #[serde(default)]
    pub total_queue_time: i64,
    // Latency aggregates are fractional in some service versions.
    #[serde(default)]
    pub average_model_latency: f64,
    #[serde(default)]
    pub total_model_latency: f64,
    #[serde(default)]
    pub elapsed_time: i64,
    pub starting_result_summarizing: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_summarizing: i64,
    #[serde(default)]
    pub input_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<BTreeMap<String, ResultsEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<BTreeMap<String, Failure>>,
}

/// Per-input outcome of a completed input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsEntry {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub input_fetching: Option<i64>,
    #[serde(default)]
    pub output_uploading: Option<Value>,
    #[serde(default)]
    pub model_latency: Option<f64>,
    #[serde(default)]
    pub queue_time: Option<i64>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub update_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(rename = "results.json", default, skip_serializing_if = "Option::is_none")]
    pub results_json: Option<ResultsJson>,
    #[serde(rename = "results.wav", default, skip_serializing_if = "Option::is_none")]
    pub results_wav: Option<String>,
    #[serde(default)]
    pub voting: Voting,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voting {
    #[serde(default)]
    pub up: i64,
    #[serde(default)]
    pub down: i64,
}

/// Per-input failure detail; timing fields are present only when the input
/// partially executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub input_fetching: Option<i64>,
    #[serde(default)]
    pub output_uploading: Option<Value>,
    #[serde(default)]
    pub model_latency: Option<f64>,
    #[serde(default)]
    pub queue_time: Option<i64>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub update_time: String,
    #[serde(default)]
    pub end_time: String,
}

/// The sample-input template for one model version: for each input group
/// key, the set of named parameters an input row must provide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSampleInput {
    pub model: SampleInputModel,
    pub input: SampleInputSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleInputModel {
    pub identifier: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleInputSpec {
    #[serde(rename = "type", default)]
    pub input_type: String,
    #[serde(rename = "accessKeyID", default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub sources: BTreeMap<String, BTreeMap<String, SourceValue>>,
}

/// Payload POSTed to submit a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmission {
    pub model: SubmissionModel,
    pub explain: bool,
    pub input: SubmissionInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionModel {
    pub identifier: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionInput {
    #[serde(rename = "type")]
    pub input_type: String,
    pub sources: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_decodes_with_polymorphic_inputs() {
        let job: Job = serde_json::from_value(json!({
            "jobIdentifier": "0b3a3997-c997-4c4c-b06b-3f25c1f62ef7",
            "model": {"identifier": "ed542963de", "version": "1.0.1", "name": "Sentiment"},
            "status": "SUBMITTED",
            "totalInputs": 1,
            "explain": false,
            "submittedAt": "2021-07-14T18:35:07.704+00:00",
            "jobInputs": {"identifier": "input-0001"}
        }))
        .unwrap();
        assert_eq!(job.status, "SUBMITTED");
        assert_eq!(job.model.version, "1.0.1");
        let inputs = job.job_inputs.unwrap();
        assert_eq!(inputs.identifiers().len(), 1);
        assert_eq!(inputs.identifiers()[0].identifier, "input-0001");
    }

    #[test]
    fn job_identifier_is_opaque() {
        // Older service versions reported UUIDs; newer ones arbitrary
        // strings. Both decode.
        let job: Job = serde_json::from_value(json!({
            "jobIdentifier": "not-a-uuid-anymore",
            "status": "PENDING"
        }))
        .unwrap();
        assert_eq!(job.job_identifier, "not-a-uuid-anymore");
    }

    fn results_fixture() -> Results {
        serde_json::from_value(json!({
            "jobIdentifier": "j-1",
            "total": 3,
            "completed": 2,
            "failed": 1,
            "finished": true,
            "elapsedTime": 812,
            "averageModelLatency": 120.5,
            "results": {
                "0001": {"status": "SUCCESSFUL", "engine": "e-1",
                         "results.json": ["ok"]},
                "0002": {"status": "SUCCESSFUL", "engine": "e-1",
                         "results.json": {"data": {"result":
                             {"classPredictions": [{"class": "cat", "score": 0.9}]}}}}
            },
            "failures": {
                "0003": {"status": "FAILED", "engine": "e-2", "error": "bad input"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn finished_results_account_for_every_declared_input() {
        let results = results_fixture();
        let outcome_keys = results.results.as_ref().unwrap();
        let failure_keys = results.failures.as_ref().unwrap();

        // Every declared input appears in exactly one of the two maps.
        assert_eq!(
            outcome_keys.len() as i64 + failure_keys.len() as i64,
            results.total
        );
        assert!(outcome_keys.keys().all(|k| !failure_keys.contains_key(k)));
        assert!(results.finished);

        // Dropping an entry from either map breaks the accounting.
        let mut partial = results.clone();
        partial.results.as_mut().unwrap().remove("0001");
        assert_ne!(
            partial.results.as_ref().unwrap().len() as i64
                + partial.failures.as_ref().unwrap().len() as i64,
            partial.total
        );
    }

    #[test]
    fn results_round_trip_preserves_nested_payload_shapes() {
        let results = results_fixture();
        let wire = serde_json::to_value(&results).unwrap();
        assert_eq!(wire["results"]["0001"]["results.json"], json!(["ok"]));
        assert_eq!(
            wire["results"]["0002"]["results.json"]["data"]["result"]["classPredictions"][0]
                ["class"],
            json!("cat")
        );
        let decoded: Results = serde_json::from_value(wire).unwrap();
        assert_eq!(decoded.total, results.total);
        assert_eq!(decoded.average_model_latency, results.average_model_latency);
    }

    #[test]
    fn sample_input_decodes_bare_and_structured_sources() {
        let sample: ModelSampleInput = serde_json::from_value(json!({
            "model": {"identifier": "ed542963de", "version": "1.0.1"},
            "input": {
                "type": "embedded",
                "sources": {
                    "0001": {"input.txt": "the quick brown fox"},
                    "0002": {"config.json": {"language": "en", "top": 3}}
                }
            }
        }))
        .unwrap();
        let sources = &sample.input.sources;
        let bare = &sources["0001"]["input.txt"];
        assert_eq!(bare.entries()["input"], json!("the quick brown fox"));
        let structured = &sources["0002"]["config.json"];
        assert_eq!(structured.entries()["language"], json!("en"));
    }
}
