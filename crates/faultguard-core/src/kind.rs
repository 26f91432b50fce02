//! Failure kinds and matchers.
//!
//! Policies decide what to do with a failure by comparing its
//! [`FailureKind`] (and the kind of its direct cause) against the kinds
//! listed in their metadata, e.g. a retry policy's `retry_on` and
//! `abort_on` sets. Operation error types opt in by implementing
//! [`Classify`].
//!
//! ```
//! use faultguard_core::{Classify, FailureKind, FailureSet};
//!
//! #[derive(Debug)]
//! enum DbError {
//!     ConnectionReset,
//!     ConstraintViolation,
//! }
//!
//! impl Classify for DbError {
//!     fn kind(&self) -> FailureKind {
//!         match self {
//!             DbError::ConnectionReset => FailureKind::new("db.connection_reset"),
//!             DbError::ConstraintViolation => FailureKind::new("db.constraint"),
//!         }
//!     }
//! }
//!
//! let abort_on = FailureSet::of([FailureKind::new("db.constraint")]);
//! assert!(abort_on.matches(&DbError::ConstraintViolation));
//! assert!(!abort_on.matches(&DbError::ConnectionReset));
//! ```

use std::borrow::Cow;
use std::fmt;

/// Tag naming a category of failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FailureKind(Cow<'static, str>);

impl FailureKind {
    /// Matches every failure when listed in a [`FailureSet`].
    pub const ANY: FailureKind = FailureKind::new("*");
    /// A timeout policy gave up waiting.
    pub const TIMEOUT: FailureKind = FailureKind::new("faultguard.timeout");
    /// A circuit breaker rejected the call.
    pub const CIRCUIT_OPEN: FailureKind = FailureKind::new("faultguard.circuit_open");
    /// A bulkhead rejected the call.
    pub const BULKHEAD_FULL: FailureKind = FailureKind::new("faultguard.bulkhead_full");
    /// A retry policy ran out of retries.
    pub const RETRY_EXHAUSTED: FailureKind = FailureKind::new("faultguard.retry_exhausted");
    /// A retry policy stopped on a non-retryable failure.
    pub const RETRY_ABORTED: FailureKind = FailureKind::new("faultguard.retry_aborted");
    /// A retry policy ran past its max duration.
    pub const DEADLINE_EXCEEDED: FailureKind = FailureKind::new("faultguard.deadline_exceeded");
    /// Queued work was cancelled before it produced a result.
    pub const INTERRUPTED: FailureKind = FailureKind::new("faultguard.interrupted");
    /// Policy metadata was invalid.
    pub const DEFINITION: FailureKind = FailureKind::new("faultguard.definition");

    /// Creates a kind from a static name.
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a kind from an owned name, e.g. one read from configuration.
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the kind's name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true for the wildcard kind.
    pub fn is_any(&self) -> bool {
        self.0 == "*"
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for FailureKind {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

/// Classifies a failure for kind matching.
pub trait Classify {
    /// The failure's own kind.
    fn kind(&self) -> FailureKind;

    /// The kind of the failure this one directly wraps, if any.
    fn cause_kind(&self) -> Option<FailureKind> {
        None
    }
}

impl<C: Classify + ?Sized> Classify for Box<C> {
    fn kind(&self) -> FailureKind {
        (**self).kind()
    }

    fn cause_kind(&self) -> Option<FailureKind> {
        (**self).cause_kind()
    }
}

impl Classify for std::io::Error {
    fn kind(&self) -> FailureKind {
        FailureKind::new("io")
    }
}

impl Classify for dyn std::error::Error + Send + Sync {
    fn kind(&self) -> FailureKind {
        FailureKind::new("error")
    }
}

/// A set of failure kinds a policy reacts to.
///
/// An empty set never matches. A set containing [`FailureKind::ANY`]
/// matches everything. Otherwise a failure matches when its kind, or the
/// kind of its direct cause, is in the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FailureSet(Vec<FailureKind>);

impl FailureSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a set that matches every failure.
    pub fn any() -> Self {
        Self(vec![FailureKind::ANY])
    }

    /// Creates a set from the given kinds, dropping duplicates.
    pub fn of<I, K>(kinds: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FailureKind>,
    {
        let mut set = Self::new();
        for kind in kinds {
            set.insert(kind.into());
        }
        set
    }

    /// Adds a kind; returns false if it was already present.
    pub fn insert(&mut self, kind: FailureKind) -> bool {
        if self.0.contains(&kind) {
            return false;
        }
        self.0.push(kind);
        true
    }

    /// Returns true if the set has no kinds.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of kinds.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the kind is listed (no wildcard expansion).
    pub fn contains(&self, kind: &FailureKind) -> bool {
        self.0.contains(kind)
    }

    /// Iterates over the listed kinds.
    pub fn iter(&self) -> impl Iterator<Item = &FailureKind> {
        self.0.iter()
    }

    /// Tests a failure against the set.
    pub fn matches<C: Classify + ?Sized>(&self, failure: &C) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let kind = failure.kind();
        let cause = failure.cause_kind();
        self.0
            .iter()
            .any(|entry| entry.is_any() || *entry == kind || cause.as_ref() == Some(entry))
    }
}

impl<K: Into<FailureKind>> FromIterator<K> for FailureSet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl From<Vec<FailureKind>> for FailureSet {
    fn from(kinds: Vec<FailureKind>) -> Self {
        Self::of(kinds)
    }
}
