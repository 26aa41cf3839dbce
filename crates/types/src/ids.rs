//! Newtype wrappers for identifiers that cross the engine boundary.
//!
//! These keep producer handles and reference ids from being mixed up with plain
//! integers and strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque back-reference to whatever produced an element.
///
/// The engine never dereferences it; it only compares ids, e.g. to find the lines
/// that belong to one paragraph during page breaking.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProducerId(pub u32);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An identifier that content can refer to before it is known (e.g. a page citation target).
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RefId(Arc<str>);

impl RefId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RefId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for RefId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for RefId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
