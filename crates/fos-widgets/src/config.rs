//! Widget tree configuration

use serde::{Deserialize, Serialize};

/// How the root reacts when a bulk attach/detach below it reports failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Hand the aggregated failure back to the caller
    #[default]
    Propagate,
    /// Log the failure set and report success
    LogAndContinue,
}

/// Widget tree configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Policy applied by root-level operations (adding to the root, teardown)
    pub failure_policy: FailurePolicy,

    /// Upper bound on deferred-command rounds run by one `finish_turn`
    pub max_deferred_rounds: usize,

    /// Tag used for the root element when the document has no body
    pub root_tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Propagate,
            max_deferred_rounds: 16,
            root_tag: "body".to_string(),
        }
    }
}
