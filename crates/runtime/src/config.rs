//! Runtime tunables.

use std::time::Duration;

use skirmish_core::RulesConfig;

/// Runtime configuration parameters
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub rules: RulesConfig,
    pub event_buffer_size: usize,
    /// Capacity of the privileged relay's request channel.
    pub relay_buffer_size: usize,
    /// Quiet period the removal queue waits for before flushing a batch.
    pub removal_debounce: Duration,
    /// Upper bound on host events processed for one dispatch, follow-ups included.
    pub max_hook_events: usize,
}

impl RuntimeConfig {
    pub fn with_rules(rules: RulesConfig) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            event_buffer_size: 100,
            relay_buffer_size: 32,
            removal_debounce: Duration::from_millis(100),
            max_hook_events: 256,
        }
    }
}
