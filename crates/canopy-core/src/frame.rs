//! Call-site identity.
//!
//! # Overview
//!
//! A [`Frame`] is an immutable, value-typed bundle of attributes identifying
//! one location in a program's call structure — typically a function name,
//! source file, and line. Frames are the partition key for normalization:
//! two sibling vertices merge exactly when their frames compare equal.
//!
//! Attributes live in a `BTreeMap`, so equality, hashing, ordering, and
//! display are all derived from a stable sorted key order.
//!
//! # Usage
//!
//! ```rust,ignore
//! use canopy_core::frame::Frame;
//!
//! let frame = Frame::new([("name", "main"), ("file", "app.c")]);
//! assert_eq!(frame, Frame::new([("file", "app.c"), ("name", "main")]));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AttrValue
// ---------------------------------------------------------------------------

/// One frame attribute value.
///
/// Integer attributes (line/column numbers) and string attributes (function
/// and file names) cover what profiler readers emit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// A numeric attribute such as a line number.
    Int(i64),
    /// A textual attribute such as a function name.
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Immutable identity of a call site.
///
/// Value equality, `Ord`, and `Hash` all follow the sorted attribute map,
/// making `Frame` directly usable as a partition or map key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame {
    attrs: BTreeMap<String, AttrValue>,
}

impl Frame {
    /// Build a frame from `(key, value)` pairs.
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            attrs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build the common single-attribute frame `{name: ...}`.
    pub fn name(name: impl Into<String>) -> Self {
        Self::new([("name", name.into())])
    }

    /// Look up one attribute by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Project a caller-selected subset of attributes, in the order the
    /// caller listed them. Missing attributes project as `None`.
    ///
    /// This is the contract traversal consumers use when output is reduced
    /// to selected attributes rather than full vertex handles.
    #[must_use]
    pub fn values<'a>(&'a self, keys: &[&str]) -> Vec<Option<&'a AttrValue>> {
        keys.iter().map(|key| self.attrs.get(*key)).collect()
    }

    /// Iterate all attributes in sorted key order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Returns `true` if the frame carries no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
