//! Run policies that used to be implicit shell behavior.

use serde::{Deserialize, Serialize};

/// What the pipeline does after a step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltPolicy {
    /// Keep going; later steps run and the run is reported as failed.
    #[default]
    Continue,
    /// Stop at the first failed step; remaining steps are reported as not run.
    Halt,
}

impl HaltPolicy {
    #[must_use]
    pub const fn halts(self) -> bool {
        matches!(self, Self::Halt)
    }
}

/// How bucket discovery treats more than one matching bucket name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketAmbiguity {
    /// Leave the bucket unresolved and report every candidate.
    #[default]
    Error,
    /// Take the first name in listing order.
    First,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_continue_and_error() {
        assert_eq!(HaltPolicy::default(), HaltPolicy::Continue);
        assert!(!HaltPolicy::default().halts());
        assert_eq!(BucketAmbiguity::default(), BucketAmbiguity::Error);
    }

    #[test]
    fn policies_use_snake_case_names() {
        let halt: HaltPolicy = serde_json::from_str("\"halt\"").expect("known value");
        assert!(halt.halts());
        let first: BucketAmbiguity = serde_json::from_str("\"first\"").expect("known value");
        assert_eq!(first, BucketAmbiguity::First);
    }
}
