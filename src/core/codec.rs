//! Decode/encode rules for the wire fields whose JSON shape varies across
//! service versions: source values (bare string or object), job input
//! identifier references (object or array), and per-input `results.json`
//! payloads (structured object or bare string list). Decode always sniffs
//! the token shape and normalizes; encode collapses back to the compact
//! shape where the wire format expects it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::core::error::{ClientError, ClientResult};

/// Synthetic key a bare source value is filed under after decode.
pub const SINGLE_SOURCE_KEY: &str = "input";

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn schema_violation(field: &'static str, value: &Value) -> ClientError {
    ClientError::SchemaViolation {
        field,
        kind: json_kind(value),
    }
}

/// One source value of a sample-input template or job submission: an
/// arbitrary parameter-name → value mapping. A bare wire string decodes to a
/// one-entry mapping under [`SINGLE_SOURCE_KEY`]; encoding collapses that
/// case back to the bare value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceValue(Map<String, Value>);

impl SourceValue {
    /// Wraps a single unnamed payload under the synthetic key.
    pub fn single(value: Value) -> Self {
        let mut entries = Map::new();
        entries.insert(SINGLE_SOURCE_KEY.to_string(), value);
        SourceValue(entries)
    }

    pub fn from_entries(entries: Map<String, Value>) -> Self {
        SourceValue(entries)
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Shape sniff for a source value token: string or object, nothing else.
pub fn decode_source_value(value: Value) -> ClientResult<SourceValue> {
    match value {
        Value::String(s) => Ok(SourceValue::single(Value::String(s))),
        Value::Object(entries) => Ok(SourceValue(entries)),
        other => Err(schema_violation("sources", &other)),
    }
}

impl Serialize for SourceValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.len() == 1 {
            if let Some(value) = self.0.get(SINGLE_SOURCE_KEY) {
                return value.serialize(serializer);
            }
        }
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_source_value(value).map_err(serde::de::Error::custom)
    }
}

/// One identifier reference inside a job's inputs field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputIdentifier {
    pub identifier: String,
}

/// A job's input references, normalized to a list. The wire carries either a
/// single `{identifier: ...}` object or an array of them; a one-element list
/// encodes back to the bare object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobInputs(Vec<InputIdentifier>);

impl JobInputs {
    pub fn new(identifiers: Vec<InputIdentifier>) -> Self {
        JobInputs(identifiers)
    }

    pub fn identifiers(&self) -> &[InputIdentifier] {
        &self.0
    }
}

fn decode_input_identifier(mut entries: Map<String, Value>) -> ClientResult<InputIdentifier> {
    match entries.remove("identifier") {
        Some(Value::String(identifier)) => Ok(InputIdentifier { identifier }),
        Some(other) => Err(schema_violation("jobInputs.identifier", &other)),
        None => Err(schema_violation("jobInputs.identifier", &Value::Null)),
    }
}

/// Shape sniff for the job inputs token: one identifier object or an array
/// of identifier objects, always normalized to a list.
pub fn decode_job_inputs(value: Value) -> ClientResult<JobInputs> {
    match value {
        Value::Object(entries) => Ok(JobInputs(vec![decode_input_identifier(entries)?])),
        Value::Array(items) => {
            let mut identifiers = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(entries) => identifiers.push(decode_input_identifier(entries)?),
                    other => return Err(schema_violation("jobInputs", &other)),
                }
            }
            Ok(JobInputs(identifiers))
        }
        other => Err(schema_violation("jobInputs", &other)),
    }
}

impl Serialize for JobInputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.len() == 1 {
            self.0[0].serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for JobInputs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_job_inputs(value).map_err(serde::de::Error::custom)
    }
}

/// One class/score prediction of a structured model output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPrediction {
    #[serde(rename = "class")]
    pub class_name: String,
    pub score: f64,
}

/// The `result` block of a structured output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSet {
    pub class_predictions: Vec<ClassPrediction>,
}

/// The `data` envelope of a structured output; explanation and drift stay
/// opaque.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsData {
    pub result: PredictionSet,
    pub explanation: Value,
    pub drift: Value,
}

/// The per-input `results.json` payload. Some models report a structured
/// `data` envelope with class predictions, others a bare list of strings;
/// the two variants are mutually exclusive in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsJson {
    Structured(ResultsData),
    RawList(Vec<String>),
}

fn decode_prediction_set(value: Value) -> ClientResult<PredictionSet> {
    let mut entries = match value {
        Value::Object(entries) => entries,
        other => return Err(schema_violation("results.json.data.result", &other)),
    };
    let mut class_predictions = Vec::new();
    if let Some(predictions) = entries.remove("classPredictions") {
        let items = match predictions {
            Value::Array(items) => items,
            other => return Err(schema_violation("classPredictions", &other)),
        };
        for item in items {
            let mut entries = match item {
                Value::Object(entries) => entries,
                other => return Err(schema_violation("classPredictions", &other)),
            };
            let class_name = match entries.remove("class") {
                Some(Value::String(class_name)) => class_name,
                Some(other) => return Err(schema_violation("classPredictions.class", &other)),
                None => return Err(schema_violation("classPredictions.class", &Value::Null)),
            };
            let score = match entries.remove("score") {
                Some(Value::Number(score)) => score.as_f64().unwrap_or_default(),
                Some(other) => return Err(schema_violation("classPredictions.score", &other)),
                None => return Err(schema_violation("classPredictions.score", &Value::Null)),
            };
            class_predictions.push(ClassPrediction { class_name, score });
        }
    }
    Ok(PredictionSet { class_predictions })
}

/// Shape sniff for the `results.json` token: a `data` envelope populates the
/// structured variant, a bare array of strings the raw-list variant.
pub fn decode_results_json(value: Value) -> ClientResult<ResultsJson> {
    match value {
        Value::Object(mut entries) => {
            let data = entries
                .remove("data")
                .ok_or(ClientError::SchemaViolation {
                    field: "results.json.data",
                    kind: "null",
                })?;
            let mut data = match data {
                Value::Object(data) => data,
                other => return Err(schema_violation("results.json.data", &other)),
            };
            let result = match data.remove("result") {
                Some(value) => decode_prediction_set(value)?,
                None => PredictionSet::default(),
            };
            let explanation = data.remove("explanation").unwrap_or(Value::Null);
            let drift = data.remove("drift").unwrap_or(Value::Null);
            Ok(ResultsJson::Structured(ResultsData {
                result,
                explanation,
                drift,
            }))
        }
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => list.push(s),
                    other => return Err(schema_violation("results.json", &other)),
                }
            }
            Ok(ResultsJson::RawList(list))
        }
        other => Err(schema_violation("results.json", &other)),
    }
}

impl Serialize for ResultsJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultsJson::Structured(data) => {
                #[derive(Serialize)]
                struct Envelope<'a> {
                    data: &'a ResultsData,
                }
                Envelope { data }.serialize(serializer)
            }
            ResultsJson::RawList(list) => list.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResultsJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_results_json(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_schema_violation(err: ClientError, field: &str, kind: &str) {
        match err {
            ClientError::SchemaViolation { field: f, kind: k } => {
                assert_eq!(f, field);
                assert_eq!(k, kind);
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn bare_string_source_decodes_to_single_entry_mapping() {
        let decoded = decode_source_value(json!("a cat picture")).unwrap();
        assert_eq!(decoded.entries().len(), 1);
        assert_eq!(decoded.entries()["input"], json!("a cat picture"));
    }

    #[test]
    fn object_source_preserves_every_key() {
        let decoded =
            decode_source_value(json!({"image": "data:...", "config": {"k": 1}})).unwrap();
        assert_eq!(decoded.entries().len(), 2);
        assert_eq!(decoded.entries()["image"], json!("data:..."));
        assert_eq!(decoded.entries()["config"], json!({"k": 1}));
    }

    #[test]
    fn source_encode_collapses_the_synthetic_single_entry() {
        let single = SourceValue::single(json!("payload"));
        assert_eq!(serde_json::to_value(&single).unwrap(), json!("payload"));

        let mut entries = Map::new();
        entries.insert("image".into(), json!("x"));
        entries.insert("text".into(), json!("y"));
        let multi = SourceValue::from_entries(entries);
        assert_eq!(
            serde_json::to_value(&multi).unwrap(),
            json!({"image": "x", "text": "y"})
        );
    }

    #[test]
    fn single_named_entry_does_not_collapse() {
        // Only the synthetic key collapses; a named one-entry map stays an
        // object on the wire.
        let mut entries = Map::new();
        entries.insert("image".into(), json!("x"));
        let named = SourceValue::from_entries(entries);
        assert_eq!(serde_json::to_value(&named).unwrap(), json!({"image": "x"}));
    }

    #[test]
    fn source_round_trips_through_the_wire() {
        for value in [
            SourceValue::single(json!("payload")),
            decode_source_value(json!({"a": 1, "b": "two"})).unwrap(),
        ] {
            let wire = serde_json::to_value(&value).unwrap();
            assert_eq!(decode_source_value(wire).unwrap(), value);
        }
    }

    #[test]
    fn source_rejects_non_string_non_object_tokens() {
        assert_schema_violation(
            decode_source_value(json!(42)).unwrap_err(),
            "sources",
            "number",
        );
        assert_schema_violation(
            decode_source_value(json!([1, 2])).unwrap_err(),
            "sources",
            "array",
        );
    }

    #[test]
    fn bare_identifier_object_yields_a_length_one_list() {
        let decoded = decode_job_inputs(json!({"identifier": "in-0"})).unwrap();
        assert_eq!(decoded.identifiers().len(), 1);
        assert_eq!(decoded.identifiers()[0].identifier, "in-0");
    }

    #[test]
    fn identifier_array_preserves_order() {
        let decoded =
            decode_job_inputs(json!([{"identifier": "a"}, {"identifier": "b"}])).unwrap();
        let ids: Vec<_> = decoded
            .identifiers()
            .iter()
            .map(|i| i.identifier.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn job_inputs_encode_collapses_single_element() {
        let one = JobInputs::new(vec![InputIdentifier {
            identifier: "a".into(),
        }]);
        assert_eq!(
            serde_json::to_value(&one).unwrap(),
            json!({"identifier": "a"})
        );

        let two = JobInputs::new(vec![
            InputIdentifier {
                identifier: "a".into(),
            },
            InputIdentifier {
                identifier: "b".into(),
            },
        ]);
        assert_eq!(
            serde_json::to_value(&two).unwrap(),
            json!([{"identifier": "a"}, {"identifier": "b"}])
        );
    }

    #[test]
    fn job_inputs_round_trip() {
        for value in [
            JobInputs::new(vec![InputIdentifier {
                identifier: "a".into(),
            }]),
            JobInputs::new(vec![
                InputIdentifier {
                    identifier: "a".into(),
                },
                InputIdentifier {
                    identifier: "b".into(),
                },
            ]),
        ] {
            let wire = serde_json::to_value(&value).unwrap();
            assert_eq!(decode_job_inputs(wire).unwrap(), value);
        }
    }

    #[test]
    fn job_inputs_reject_other_token_kinds() {
        assert_schema_violation(decode_job_inputs(json!("x")).unwrap_err(), "jobInputs", "string");
        assert_schema_violation(
            decode_job_inputs(json!({"identifier": 7})).unwrap_err(),
            "jobInputs.identifier",
            "number",
        );
    }

    #[test]
    fn structured_results_decode_from_data_envelope() {
        let wire = json!({
            "data": {
                "result": {
                    "classPredictions": [
                        {"class": "cat", "score": 0.93},
                        {"class": "dog", "score": 0.07}
                    ]
                },
                "explanation": null,
                "drift": {"seen": 12}
            }
        });
        let decoded = decode_results_json(wire).unwrap();
        match &decoded {
            ResultsJson::Structured(data) => {
                assert_eq!(data.result.class_predictions.len(), 2);
                assert_eq!(data.result.class_predictions[0].class_name, "cat");
                assert_eq!(data.drift, json!({"seen": 12}));
            }
            other => panic!("expected structured variant, got {other:?}"),
        }
    }

    #[test]
    fn raw_list_results_decode_from_bare_array() {
        let decoded = decode_results_json(json!(["line one", "line two"])).unwrap();
        assert_eq!(
            decoded,
            ResultsJson::RawList(vec!["line one".into(), "line two".into()])
        );
    }

    #[test]
    fn results_json_round_trips_both_variants() {
        let structured = decode_results_json(json!({
            "data": {
                "result": {"classPredictions": [{"class": "cat", "score": 1.0}]},
                "explanation": null,
                "drift": null
            }
        }))
        .unwrap();
        let raw = ResultsJson::RawList(vec!["a".into()]);

        for value in [structured, raw] {
            let wire = serde_json::to_value(&value).unwrap();
            assert_eq!(decode_results_json(wire).unwrap(), value);
        }
    }

    #[test]
    fn results_json_rejects_malformed_tokens() {
        assert_schema_violation(
            decode_results_json(json!(3.5)).unwrap_err(),
            "results.json",
            "number",
        );
        assert_schema_violation(
            decode_results_json(json!({"other": 1})).unwrap_err(),
            "results.json.data",
            "null",
        );
        assert_schema_violation(
            decode_results_json(json!({"data": "nope"})).unwrap_err(),
            "results.json.data",
            "string",
        );
    }
}
