//! Data models for transcripts.
//!
//! Segments are kept as raw JSON values so that passthrough fields, and
//! segments the timing validator rejects, survive a round trip untouched.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const MESSAGES_KEY: &str = "messages";

/// A complete transcript: ordered segments plus free-form top-level metadata.
///
/// Serializes back with `messages` at the position it had in the input
/// document; transcripts built in memory write it first.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Segments in canonical order (not necessarily chronological).
    pub messages: Vec<Segment>,
    /// Every other top-level key, preserved in input order.
    pub metadata: Map<String, Value>,
    /// Number of metadata keys that preceded `messages` in the input.
    messages_at: Option<usize>,
}

impl Transcript {
    /// Create a transcript from segments with no metadata.
    pub fn new(messages: Vec<Segment>) -> Self {
        Self {
            messages,
            metadata: Map::new(),
            messages_at: None,
        }
    }

    /// Copy of this transcript with its segments replaced; metadata and key
    /// layout are kept.
    pub fn with_messages(&self, messages: Vec<Segment>) -> Self {
        Self {
            messages,
            metadata: self.metadata.clone(),
            messages_at: self.messages_at,
        }
    }

    /// Parse a transcript from a JSON document.
    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(crate::error::RetoucheError::InvalidInput(
                "top-level JSON value must be an object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| {
            crate::error::RetoucheError::InvalidInput(format!("messages must be an array: {}", e))
        })
    }

    /// Serialize as pretty-printed JSON (non-ASCII kept as-is).
    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get a top-level metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Set a top-level metadata value, replacing any previous one.
    pub fn set(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Segment contents joined by newlines; missing content counts as empty.
    pub fn full_text(&self) -> String {
        self.messages
            .iter()
            .map(|s| s.content().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Sorted, de-duplicated speaker labels ("unknown" when absent).
    pub fn speakers(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|s| s.speaker().unwrap_or("unknown").to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Serialize for Transcript {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let metadata = self.metadata.iter().filter(|(key, _)| *key != MESSAGES_KEY);
        let at = self.messages_at.unwrap_or(0);

        let mut map = serializer.serialize_map(None)?;
        let mut written = false;
        for (i, (key, value)) in metadata.enumerate() {
            if i == at {
                map.serialize_entry(MESSAGES_KEY, &self.messages)?;
                written = true;
            }
            map.serialize_entry(key, value)?;
        }
        if !written {
            map.serialize_entry(MESSAGES_KEY, &self.messages)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Transcript {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;

        let mut metadata = Map::new();
        let mut messages = None;
        let mut messages_at = None;
        for (key, value) in object {
            if key == MESSAGES_KEY {
                messages_at = Some(metadata.len());
                messages = Some(value);
            } else {
                metadata.insert(key, value);
            }
        }

        let messages = match messages {
            Some(value) => Vec::<Segment>::deserialize(value).map_err(D::Error::custom)?,
            None => Vec::new(),
        };

        Ok(Self {
            messages,
            metadata,
            messages_at,
        })
    }
}

/// One timestamped utterance by one speaker.
///
/// Backed by the raw JSON value; typed accessors return `None` when a field is
/// missing or has the wrong shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(Value);

impl Segment {
    /// Create a well-formed segment.
    pub fn new(start_time: f64, end_time: f64, speaker: &str, content: &str) -> Self {
        let mut map = Map::new();
        map.insert("start_time".to_string(), Value::from(start_time));
        map.insert("end_time".to_string(), Value::from(end_time));
        map.insert("speaker".to_string(), Value::from(speaker));
        map.insert("content".to_string(), Value::from(content));
        Self(Value::Object(map))
    }

    /// Wrap an arbitrary JSON value.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// Raw field value, if this segment is an object and has the field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|m| m.get(key))
    }

    /// Start time in seconds, accepting numbers and numeric strings.
    pub fn start_time(&self) -> Option<f64> {
        self.field("start_time").and_then(parse_seconds)
    }

    /// End time in seconds, accepting numbers and numeric strings.
    pub fn end_time(&self) -> Option<f64> {
        self.field("end_time").and_then(parse_seconds)
    }

    pub fn speaker(&self) -> Option<&str> {
        self.field("speaker").and_then(Value::as_str)
    }

    pub fn content(&self) -> Option<&str> {
        self.field("content").and_then(Value::as_str)
    }

    /// Copy of this segment with `content` replaced and every other field intact.
    ///
    /// Non-object segments are returned unchanged.
    pub fn with_content(&self, content: String) -> Self {
        match &self.0 {
            Value::Object(map) => {
                let mut map = map.clone();
                map.insert("content".to_string(), Value::String(content));
                Self(Value::Object(map))
            }
            other => Self(other.clone()),
        }
    }

    /// Duration in seconds when both timestamps parse.
    pub fn duration(&self) -> Option<f64> {
        Some(self.end_time()? - self.start_time()?)
    }
}

fn parse_seconds(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    seconds.is_finite().then_some(seconds)
}
