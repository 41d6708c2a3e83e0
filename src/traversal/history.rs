//! Recursion guard: the types on the active construction path.

use crate::types::TypeDescriptor;
use std::fmt;

/// Ordered set of descriptors from the root request down to the current type.
///
/// Extending returns a new path and leaves the original untouched, so sibling
/// branches share their ancestors but never see each other's in-flight types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    path: Vec<TypeDescriptor>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.path.contains(descriptor)
    }

    /// This path with `descriptor` appended.
    pub fn extended(&self, descriptor: TypeDescriptor) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(descriptor);
        History { path }
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.path.iter()
    }

    /// Instance path: every descriptor rendered and joined with `.`.
    pub fn render(&self) -> String {
        self.path
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRef;

    #[test]
    fn test_extending_does_not_touch_the_parent() {
        let root = History::new().extended(TypeDescriptor::plain("A"));
        let left = root.extended(TypeDescriptor::plain("B"));
        let right = root.extended(TypeDescriptor::plain("C"));

        assert_eq!(root.len(), 1);
        assert!(left.contains(&TypeDescriptor::plain("B")));
        assert!(!right.contains(&TypeDescriptor::plain("B")));
        assert_eq!(left.render(), "A.B");
        assert_eq!(right.render(), "A.C");
    }

    #[test]
    fn test_render_includes_generic_arguments() {
        let list = TypeDescriptor::normalize(&TypeRef::generic(
            "Map",
            vec![TypeRef::text(), TypeRef::list_of(TypeRef::int())],
        ));
        let history = History::new()
            .extended(TypeDescriptor::plain("shop::Order"))
            .extended(list);
        assert_eq!(history.render(), "Order.Map<String,List<i32>>");
    }
}
