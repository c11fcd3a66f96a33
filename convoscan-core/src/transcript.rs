// File: convoscan-core/src/transcript.rs
//! Transcript and utterance types, plus the ingestion boundary that turns a
//! JSON document into a `Transcript`.
//!
//! Records are validated once here. A record that is not an object, or whose
//! `speaker`/`text` are not strings, becomes an empty utterance: scanners skip
//! it while every other utterance keeps its original index.
//!
//! License: MIT OR Apache-2.0

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ConvoscanError;

/// Role a speaker label is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Agent,
    Counterparty,
    Unknown,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Agent => "agent",
            SpeakerRole::Counterparty => "counterparty",
            SpeakerRole::Unknown => "unknown",
        }
    }
}

/// Keyword lists used to classify free-form speaker labels.
///
/// Classification is a case-insensitive substring match on the trimmed label.
/// Agent keywords are checked first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleVocabulary {
    pub agent: Vec<String>,
    pub counterparty: Vec<String>,
}

impl Default for RoleVocabulary {
    fn default() -> Self {
        Self::new(
            vec!["agent".to_string()],
            ["borrower", "customer", "client", "caller", "debtor"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl RoleVocabulary {
    pub fn new(agent: Vec<String>, counterparty: Vec<String>) -> Self {
        let lower = |v: Vec<String>| -> Vec<String> {
            v.into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        Self {
            agent: lower(agent),
            counterparty: lower(counterparty),
        }
    }

    pub fn classify(&self, speaker: &str) -> SpeakerRole {
        let label = speaker.trim().to_lowercase();
        if label.is_empty() {
            return SpeakerRole::Unknown;
        }
        if self.agent.iter().any(|k| label.contains(k.as_str())) {
            SpeakerRole::Agent
        } else if self.counterparty.iter().any(|k| label.contains(k.as_str())) {
            SpeakerRole::Counterparty
        } else {
            SpeakerRole::Unknown
        }
    }
}

/// One speaker turn. Auxiliary fields (timestamp, turn index, ...) are kept in
/// `extra` and serialized back flattened next to `speaker` and `text`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Utterance {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Utterance {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Empty or whitespace-only text. Such utterances never produce findings.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Builds an utterance from a raw JSON record, or `None` when the record
    /// is not usable.
    fn from_record(record: Value) -> Option<Self> {
        let Value::Object(mut fields) = record else {
            return None;
        };

        let speaker = match fields.remove("speaker") {
            Some(Value::String(s)) => s,
            None | Some(Value::Null) => String::new(),
            Some(_) => return None,
        };
        let text = match fields.remove("text") {
            Some(Value::String(s)) => s,
            None | Some(Value::Null) => String::new(),
            Some(_) => return None,
        };

        Some(Self { speaker, text, extra: fields })
    }
}

/// An ordered conversation. Order is conversational time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    utterances: Vec<Utterance>,
}

impl Transcript {
    pub fn new(utterances: Vec<Utterance>) -> Self {
        Self { utterances }
    }

    /// Parses a JSON document. Fails with `Format` if it is not valid JSON or
    /// not an array.
    pub fn from_json_str(input: &str) -> Result<Self, ConvoscanError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| ConvoscanError::Format(format!("input is not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConvoscanError> {
        let records = match value {
            Value::Array(records) => records,
            other => {
                return Err(ConvoscanError::Format(format!(
                    "expected a JSON array of utterance records, found {}",
                    json_kind(&other)
                )))
            }
        };

        let utterances: Vec<Utterance> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                Utterance::from_record(record).unwrap_or_else(|| {
                    debug!("Record {} is malformed; it will be skipped by the scanners.", index);
                    Utterance::default()
                })
            })
            .collect();

        debug!("Ingested transcript with {} utterance(s).", utterances.len());
        Ok(Self { utterances })
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Utterance> {
        self.utterances.iter()
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// `speaker: text` lines for every non-blank utterance.
    pub fn format_conversation(&self) -> String {
        self.utterances
            .iter()
            .filter(|u| !u.is_blank())
            .map(|u| format!("{}: {}", u.speaker, u.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Utterance>> for Transcript {
    fn from(utterances: Vec<Utterance>) -> Self {
        Self::new(utterances)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
