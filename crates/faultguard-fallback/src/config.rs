//! Declarative fallback metadata.

use faultguard_core::{FailureKind, FailureSet};

/// Declarative fallback metadata attached to an operation.
///
/// The fallback itself is code, registered with
/// [`FallbackManager::register_handler`](crate::FallbackManager::register_handler).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FallbackMetadata {
    /// Failure kinds the fallback handles. Default: every kind
    pub apply_on: FailureSet,
    /// Failure kinds always propagated, even when `apply_on` matches. Default: none
    pub skip_on: FailureSet,
    /// Whether the policy applies at all. Default: true
    pub enabled: bool,
}

impl Default for FallbackMetadata {
    fn default() -> Self {
        Self {
            apply_on: FailureSet::any(),
            skip_on: FailureSet::new(),
            enabled: true,
        }
    }
}

impl FallbackMetadata {
    /// Creates metadata with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the failure kinds the fallback handles.
    pub fn with_apply_on<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        self.apply_on = FailureSet::of(kinds);
        self
    }

    /// Replaces the failure kinds that are always propagated.
    pub fn with_skip_on<I, K>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        self.skip_on = FailureSet::of(kinds);
        self
    }

    /// Enables or disables the policy.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Validated fallback policy for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackModel {
    apply_on: FailureSet,
    skip_on: FailureSet,
    disabled: bool,
}

impl FallbackModel {
    pub fn from_metadata(metadata: &FallbackMetadata) -> Self {
        Self {
            apply_on: metadata.apply_on.clone(),
            skip_on: metadata.skip_on.clone(),
            disabled: !metadata.enabled,
        }
    }

    pub fn apply_on(&self) -> &FailureSet {
        &self.apply_on
    }

    pub fn skip_on(&self) -> &FailureSet {
        &self.skip_on
    }

    /// Returns true if the policy was declared but switched off.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}
