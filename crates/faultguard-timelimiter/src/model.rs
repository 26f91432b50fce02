use crate::config::TimeoutMetadata;
use faultguard_core::DefinitionError;
use std::time::Duration;

/// Validated timeout policy for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutModel {
    timeout: Duration,
    disabled: bool,
}

impl TimeoutModel {
    /// Validates `metadata`. A zero timeout is allowed and lets only calls
    /// that complete on their first poll succeed.
    pub fn from_metadata(metadata: &TimeoutMetadata) -> Result<Self, DefinitionError> {
        let timeout = metadata.unit.resolve(metadata.value, "timeout", "value")?;
        Ok(Self {
            timeout,
            disabled: !metadata.enabled,
        })
    }

    /// Time allowed for one call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true if the policy was declared but switched off.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}
