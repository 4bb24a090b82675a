use serde::{Deserialize, Serialize};

/// What `seek` does with a target past the current total length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekPolicy {
    /// Land on the append position (`len()`).
    #[default]
    Clamp,
    /// Reject with `ArgumentOutOfRange`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub seek_policy: SeekPolicy,

    /// Whether to collect telemetry counters during I/O.
    /// - `None` or `Some(false)` → disabled (production default).
    /// - `Some(true)` → counters available through `CompositeStream::telemetry`.
    pub collect_telemetry: Option<bool>,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            seek_policy: SeekPolicy::Clamp,
            collect_telemetry: Some(false),
        }
    }
}

impl CompositeConfig {
    pub fn new(seek_policy: Option<SeekPolicy>, collect_telemetry: Option<bool>) -> Self {
        Self {
            seek_policy: seek_policy.unwrap_or_default(),
            collect_telemetry: collect_telemetry.or(Some(false)),
        }
    }

    pub fn with_telemetry_enabled() -> Self {
        Self { collect_telemetry: Some(true), ..Self::default() }
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.collect_telemetry.unwrap_or(false)
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
