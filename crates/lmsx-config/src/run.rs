//! Pipeline run policy.

use lmsx_core::HaltPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    /// Whether a failed step stops the remaining steps.
    #[serde(default)]
    pub halt: HaltPolicy,
}
