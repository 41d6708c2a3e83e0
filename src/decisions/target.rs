//! Addressable locations in an object graph.

use crate::types::split_path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the object graph a constraint or choice applies.
///
/// `instance_path` is the `.`-joined rendering of every type on the active
/// construction path, the constructed type last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "instancePath")]
    pub instance_path: String,

    #[serde(rename = "methodPath", default, skip_serializing_if = "Option::is_none")]
    pub method_path: Option<String>,

    #[serde(rename = "typeName", default)]
    pub type_name: String,
}

impl Target {
    /// Target for an instance path; the type name is taken from the last segment.
    pub fn at(instance_path: impl Into<String>) -> Self {
        let instance_path = instance_path.into();
        let type_name = split_path(&instance_path)
            .last()
            .map(|segment| segment.split('<').next().unwrap_or(segment).to_string())
            .unwrap_or_default();
        Target {
            instance_path,
            method_path: None,
            type_name,
        }
    }

    pub fn with_method(mut self, method_path: impl Into<String>) -> Self {
        self.method_path = Some(method_path.into());
        self
    }

    pub fn segments(&self) -> Vec<&str> {
        split_path(&self.instance_path)
    }

    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// Whether this target's instance path is a whole-segment prefix of `other`'s.
    ///
    /// `A` covers `A` and `A.B`, but not `AB`.
    pub fn covers(&self, other: &Target) -> bool {
        let mine = self.segments();
        let theirs = other.segments();
        !mine.is_empty() && mine.len() <= theirs.len() && mine.iter().zip(&theirs).all(|(a, b)| a == b)
    }

    pub fn same_location(&self, other: &Target) -> bool {
        self.instance_path == other.instance_path && self.method_path == other.method_path
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.instance_path)?;
        if let Some(method) = &self.method_path {
            write!(f, " @ {}", method)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_from_last_segment() {
        assert_eq!(Target::at("Order.List<Item>").type_name, "List");
        assert_eq!(Target::at("Order.Item.i32").type_name, "i32");
    }

    #[test]
    fn test_covers_whole_segments_only() {
        let a = Target::at("A");
        assert!(a.covers(&Target::at("A")));
        assert!(a.covers(&Target::at("A.B")));
        assert!(!a.covers(&Target::at("AB")));
        assert!(!Target::at("A.B").covers(&a));
    }
}
