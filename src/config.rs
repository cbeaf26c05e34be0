use std::time::Duration;

use serde::Deserialize;

/// Limits applied to every evaluation.
///
/// Can be deserialized from JSON, missing fields take their default value:
///
/// ```rust
/// # use vellum::EngineConfig;
/// let config: EngineConfig = serde_json::from_str(r#"{"max_call_depth": 5}"#).unwrap();
/// assert_eq!(config.max_call_depth, 5);
/// assert_eq!(config.max_output_len, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Iterations of a single `#foreach` after which the loop silently stops
    pub max_foreach_iterations: Option<usize>,
    /// Output size in bytes after which the evaluation halts as incomplete
    pub max_output_len: Option<usize>,
    /// How deeply macros can call each other
    pub max_call_depth: usize,
}

impl EngineConfig {
    pub fn max_foreach_iterations(mut self, limit: usize) -> Self {
        self.max_foreach_iterations = Some(limit);
        self
    }

    pub fn max_output_len(mut self, limit: usize) -> Self {
        self.max_output_len = Some(limit);
        self
    }

    pub fn max_call_depth(mut self, limit: usize) -> Self {
        self.max_call_depth = limit;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig { max_foreach_iterations: None, max_output_len: None, max_call_depth: 20 }
    }
}

/// Settings of a preview session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// How long error notices stay on screen, in milliseconds
    pub notice_duration_ms: u64,
    /// How long the save button shows its "saved" state, in milliseconds
    pub saved_indicator_delay_ms: u64,
    /// Limits for the engine the session is built with
    pub engine: EngineConfig,
}

impl PreviewConfig {
    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    pub fn saved_indicator_delay(&self) -> Duration {
        Duration::from_millis(self.saved_indicator_delay_ms)
    }

    pub fn notice_duration_ms(mut self, millis: u64) -> Self {
        self.notice_duration_ms = millis;
        self
    }

    pub fn saved_indicator_delay_ms(mut self, millis: u64) -> Self {
        self.saved_indicator_delay_ms = millis;
        self
    }

    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

impl Default for PreviewConfig {
    fn default() -> PreviewConfig {
        PreviewConfig {
            notice_duration_ms: 5000,
            saved_indicator_delay_ms: 2000,
            engine: EngineConfig::default(),
        }
    }
}
