//! Request-scoped context: answer mode, geolocation and the trace log

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Output shape requested by the caller.
///
/// The wire value is the original numeric `type` field: 1 = structured card,
/// 2 = free-text markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum AnswerMode {
    /// Structured card with rating, citations and recommendations
    Card,
    /// Free-text markdown analysis
    #[default]
    Markdown,
}

impl AnswerMode {
    pub fn is_card(&self) -> bool {
        matches!(self, Self::Card)
    }
}

impl TryFrom<u8> for AnswerMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Card),
            2 => Ok(Self::Markdown),
            other => Err(format!("unknown answer type {}, expected 1 or 2", other)),
        }
    }
}

impl From<AnswerMode> for u8 {
    fn from(mode: AnswerMode) -> Self {
        match mode {
            AnswerMode::Card => 1,
            AnswerMode::Markdown => 2,
        }
    }
}

/// Caller geolocation, threaded into every generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Read-only context for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub mode: AnswerMode,
    pub location: Option<GeoPoint>,
}

impl RequestContext {
    pub fn new(mode: AnswerMode) -> Self {
        Self {
            mode,
            location: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(GeoPoint {
            latitude,
            longitude,
        });
        self
    }
}

/// Append-only audit trail of pipeline steps.
///
/// Shared across the whole request; every component appends, nothing is ever
/// reordered or removed. An optional sink tees each label out as it is
/// appended, which is what the line-by-line streaming transport consumes.
#[derive(Debug, Default)]
pub struct TraceLog {
    steps: Vec<String>,
    sink: Option<UnboundedSender<String>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with steps carried over from the request body
    pub fn with_seed(steps: Vec<String>) -> Self {
        Self {
            steps,
            sink: None,
        }
    }

    /// Tee every appended label into the given channel
    pub fn with_sink(mut self, sink: UnboundedSender<String>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn push(&mut self, label: impl Into<String>) {
        let label = label.into();
        if let Some(sink) = &self.sink {
            // Receiver may already be gone (client disconnect); the log itself
            // still records the step.
            let _ = sink.send(label.clone());
        }
        self.steps.push(label);
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<String> {
        self.steps
    }
}
