use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Payloads decoded in one scan session, in recognition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    payloads: Vec<String>,
}

impl ScanResult {
    pub fn new(payloads: Vec<String>) -> Self {
        Self { payloads }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// All payloads joined without separator, as shown in the toast.
    pub fn concatenated(&self) -> String {
        self.payloads.concat()
    }
}

impl<S: Into<String>> FromIterator<S> for ScanResult {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// `"<payload>/status" -> status` entries for one atomic multi-path update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusUpdateRequest {
    entries: BTreeMap<String, i64>,
}

impl StatusUpdateRequest {
    /// Build the request for a scan; `None` when nothing was scanned.
    pub fn for_scan(scan: &ScanResult, status: i64) -> Option<Self> {
        if scan.is_empty() {
            return None;
        }
        let entries = scan
            .payloads()
            .iter()
            .map(|payload| (status_path(payload), status))
            .collect();
        Some(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<i64> {
        self.entries.get(path).copied()
    }

    pub fn into_updates(self) -> Map<String, Value> {
        self.entries
            .into_iter()
            .map(|(path, status)| (path, Value::from(status)))
            .collect()
    }
}

fn status_path(payload: &str) -> String {
    format!("{}/status", payload)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Empty scan, nothing was written.
    Nothing,
    Success,
    Failure(String),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Nothing => "nothing",
            Outcome::Success => "success",
            Outcome::Failure(_) => "failure",
        }
    }
}

/// Result of one status update attempt plus what to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub outcome: Outcome,
    pub message: String,
    pub payloads: String,
}

impl UpdateOutcome {
    pub fn nothing() -> Self {
        Self {
            outcome: Outcome::Nothing,
            message: String::new(),
            payloads: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Toast text; `None` for an empty scan.
    pub fn notice(&self) -> Option<String> {
        match self.outcome {
            Outcome::Nothing => None,
            _ => Some(format!("{} | QR-CODE: {}", self.message, self.payloads)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    ResultReceived,
    Updating,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Scanning => "scanning",
            SessionState::ResultReceived => "result_received",
            SessionState::Updating => "updating",
        }
    }
}

/// Fields written for a freshly registered sensor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SensorRecord {
    pub name: String,
    pub description: String,
    #[serde(rename = "statusMessage")]
    pub status_message: String,
}

impl SensorRecord {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status_message: "0".into(),
        }
    }

    /// Child updates placing every field below `key`.
    pub fn updates_under(&self, key: &str) -> Map<String, Value> {
        let mut updates = Map::new();
        updates.insert(format!("{}/name", key), Value::from(self.name.clone()));
        updates.insert(
            format!("{}/description", key),
            Value::from(self.description.clone()),
        );
        updates.insert(
            format!("{}/statusMessage", key),
            Value::from(self.status_message.clone()),
        );
        updates
    }
}
