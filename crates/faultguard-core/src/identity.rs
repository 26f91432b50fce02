//! Operation identity.

use std::fmt;
use std::sync::Arc;

/// Stable key for a guarded operation.
///
/// Built from the declaring type's fully-qualified path and the operation's
/// simple name, joined with a `.`. Every manager and the plan cache use it as
/// their only key, so two distinct operations must never produce the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(Arc<str>);

impl OperationId {
    /// Creates the id for `operation` declared on `declaring_type`.
    ///
    /// ```
    /// use faultguard_core::OperationId;
    ///
    /// let id = OperationId::new("billing::InvoiceClient", "fetch");
    /// assert_eq!(id.as_str(), "billing::InvoiceClient.fetch");
    /// ```
    pub fn new(declaring_type: &str, operation: &str) -> Self {
        let mut key = String::with_capacity(declaring_type.len() + operation.len() + 1);
        key.push_str(declaring_type);
        key.push('.');
        key.push_str(operation);
        Self(key.into())
    }

    /// Wraps an already formatted key.
    pub fn from_key(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds an [`OperationId`] for an operation declared in the current module.
///
/// ```
/// use faultguard_core::operation_id;
///
/// let id = operation_id!(load_profile);
/// assert!(id.as_str().ends_with(".load_profile"));
/// ```
#[macro_export]
macro_rules! operation_id {
    ($name:ident) => {
        $crate::OperationId::new(module_path!(), stringify!($name))
    };
}
