//! # Scope Tree
//!
//! A hierarchical overlay of `Target -> Constraint` bindings. The tree mirrors the
//! instance-path hierarchy: a binding for `Order.Item.i32` lives under path nodes
//! for `Order` and `Order.Item`, which `add_pair` creates on demand. Path nodes
//! carry a target but no constraint; the root carries neither.
//!
//! ## Resolution
//!
//! `resolve` walks from the root and considers every node that holds a constraint
//! and whose target
//!
//! - has an instance path that is a whole-segment prefix of the query's, and
//! - has no method path, or the same method path as the query.
//!
//! Among those the winner is chosen by, in order: an exact instance-path and
//! method-path match; the longest bound instance path; the deepest tree
//! position; the earliest declaration. Subtrees whose target does not match
//! are skipped, since everything below them extends their path.
//!
//! ## Insertion
//!
//! `add_pair` never replaces a node's own target or constraint. A path node
//! without a constraint adopts the new one; otherwise the new binding nests
//! beneath the existing binding for the same location, which makes the most
//! recent binding the deepest one and therefore the winner.

use super::{Constraint, Target};
use crate::error::{ConfigError, ConfigResult};

/// One node of the scope tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    target: Option<Target>,
    constraint: Option<Constraint>,
    children: Vec<Scope>,
}

impl Scope {
    pub fn new(target: Option<Target>, constraint: Option<Constraint>, children: Vec<Scope>) -> Self {
        Scope {
            target,
            constraint,
            children,
        }
    }

    fn path_node(instance_path: &str) -> Self {
        Scope::new(Some(Target::at(instance_path)), None, Vec::new())
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub fn children(&self) -> &[Scope] {
        &self.children
    }

    /// A node with neither target nor constraint.
    pub fn is_grouping(&self) -> bool {
        self.target.is_none() && self.constraint.is_none()
    }

    fn is_path_node_for(&self, instance_path: &str) -> bool {
        matches!(&self.target, Some(t) if t.instance_path == instance_path && t.method_path.is_none())
    }

    fn path_child(&mut self, instance_path: &str) -> &mut Scope {
        let idx = match self.children.iter().position(|c| c.is_path_node_for(instance_path)) {
            Some(idx) => idx,
            None => {
                self.children.push(Scope::path_node(instance_path));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Bind below this node, reusing or nesting under a node for the same location.
    fn attach(&mut self, target: Target, constraint: Constraint) {
        match self
            .children
            .iter()
            .position(|c| matches!(&c.target, Some(t) if t.same_location(&target)))
        {
            Some(idx) => self.children[idx].adopt(target, constraint),
            None => self
                .children
                .push(Scope::new(Some(target), Some(constraint), Vec::new())),
        }
    }

    fn adopt(&mut self, target: Target, constraint: Constraint) {
        if self.constraint.is_none() {
            self.constraint = Some(constraint);
            return;
        }
        self.attach(target, constraint);
    }

    fn matches(&self, query: &Target) -> bool {
        match &self.target {
            Some(t) => {
                t.covers(query) && (t.method_path.is_none() || t.method_path == query.method_path)
            }
            None => false,
        }
    }

    fn collect<'a>(&'a self, query: &Target, depth: usize, best: &mut Option<(Rank, &'a Constraint)>) {
        if self.target.is_some() && !self.matches(query) {
            return;
        }
        if let (Some(target), Some(constraint)) = (&self.target, &self.constraint) {
            let rank = Rank {
                exact: target.same_location(query),
                segments: target.depth(),
                depth,
            };
            let better = match best {
                Some((current, _)) => rank > *current,
                None => true,
            };
            if better {
                *best = Some((rank, constraint));
            }
        }
        for child in &self.children {
            child.collect(query, depth + 1, best);
        }
    }

    fn count_bindings(&self) -> usize {
        let own = usize::from(self.target.is_some() && self.constraint.is_some());
        own + self.children.iter().map(Scope::count_bindings).sum::<usize>()
    }

    fn push_bindings<'a>(&'a self, out: &mut Vec<(&'a Target, &'a Constraint)>) {
        if let (Some(t), Some(c)) = (&self.target, &self.constraint) {
            out.push((t, c));
        }
        for child in &self.children {
            child.push_bindings(out);
        }
    }
}

/// Specificity of a match; compared field by field, declaration order breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    exact: bool,
    segments: usize,
    depth: usize,
}

/// The overlay of target/constraint bindings for a generation session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeTree {
    root: Scope,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: Scope) -> Self {
        ScopeTree { root }
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Bind `constraint` at `target`, creating path nodes for every proper prefix.
    pub fn add_pair(&mut self, target: Target, constraint: Constraint) -> ConfigResult<()> {
        constraint.validate()?;
        let segments: Vec<String> = target.segments().iter().map(|s| s.to_string()).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::EmptyInstancePath);
        }

        let mut node = &mut self.root;
        for depth in 1..segments.len() {
            node = node.path_child(&segments[..depth].join("."));
        }
        if target.method_path.is_some() {
            node = node.path_child(&target.instance_path);
        }
        node.attach(target, constraint);
        Ok(())
    }

    /// Most specific constraint bound for `query`, if any.
    pub fn resolve(&self, query: &Target) -> Option<&Constraint> {
        let mut best = None;
        self.root.collect(query, 0, &mut best);
        best.map(|(_, constraint)| constraint)
    }

    pub fn binding_count(&self) -> usize {
        self.root.count_bindings()
    }

    /// Every target/constraint binding in declaration (pre-order) order.
    pub fn bindings(&self) -> Vec<(&Target, &Constraint)> {
        let mut out = Vec::new();
        self.root.push_bindings(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_prob(p: f64) -> Constraint {
        Constraint::new().with_null_prob(p)
    }

    #[test]
    fn test_deeper_binding_wins_and_prefix_falls_back() {
        let mut tree = ScopeTree::new();
        tree.add_pair(Target::at("A"), null_prob(0.1)).unwrap();
        tree.add_pair(Target::at("A.B"), null_prob(0.2)).unwrap();

        assert_eq!(tree.resolve(&Target::at("A.B")), Some(&null_prob(0.2)));
        assert_eq!(tree.resolve(&Target::at("A.C")), Some(&null_prob(0.1)));
        assert_eq!(tree.resolve(&Target::at("A.B.i32")), Some(&null_prob(0.2)));
        assert_eq!(tree.resolve(&Target::at("Z")), None);
    }

    #[test]
    fn test_insertion_order_does_not_change_specificity() {
        let mut tree = ScopeTree::new();
        tree.add_pair(Target::at("A.B"), null_prob(0.2)).unwrap();
        tree.add_pair(Target::at("A"), null_prob(0.1)).unwrap();

        assert_eq!(tree.resolve(&Target::at("A.B")), Some(&null_prob(0.2)));
        assert_eq!(tree.resolve(&Target::at("A")), Some(&null_prob(0.1)));
        // The A path node created for A.B adopted the later binding.
        assert_eq!(tree.root().children().len(), 1);
    }

    #[test]
    fn test_path_nodes_are_created_for_prefixes() {
        let mut tree = ScopeTree::new();
        tree.add_pair(Target::at("A.B.C"), null_prob(0.3)).unwrap();

        let a = &tree.root().children()[0];
        assert_eq!(a.target().unwrap().instance_path, "A");
        assert!(a.constraint().is_none());
        let b = &a.children()[0];
        assert_eq!(b.target().unwrap().instance_path, "A.B");
        assert_eq!(b.children()[0].constraint(), Some(&null_prob(0.3)));
        assert_eq!(tree.binding_count(), 1);
        assert_eq!(tree.resolve(&Target::at("A.B")), None);
    }

    #[test]
    fn test_rebinding_nests_and_latest_wins() {
        let mut tree = ScopeTree::new();
        tree.add_pair(Target::at("A"), null_prob(0.1)).unwrap();
        tree.add_pair(Target::at("A"), null_prob(0.9)).unwrap();

        let first = &tree.root().children()[0];
        assert_eq!(first.constraint(), Some(&null_prob(0.1)));
        assert_eq!(first.children()[0].constraint(), Some(&null_prob(0.9)));
        assert_eq!(tree.resolve(&Target::at("A")), Some(&null_prob(0.9)));
    }

    #[test]
    fn test_exact_method_match_beats_plain_binding() {
        let mut tree = ScopeTree::new();
        tree.add_pair(Target::at("A.i32"), null_prob(0.1)).unwrap();
        tree.add_pair(Target::at("A.i32").with_method("A::new"), null_prob(0.5)).unwrap();

        let in_ctor = Target::at("A.i32").with_method("A::new");
        assert_eq!(tree.resolve(&in_ctor), Some(&null_prob(0.5)));
        assert_eq!(tree.resolve(&Target::at("A.i32")), Some(&null_prob(0.1)));
        let elsewhere = Target::at("A.i32").with_method("A::other");
        assert_eq!(tree.resolve(&elsewhere), Some(&null_prob(0.1)));
    }

    #[test]
    fn test_rejects_invalid_pairs() {
        let mut tree = ScopeTree::new();
        assert!(tree.add_pair(Target::at(""), null_prob(0.1)).is_err());
        assert!(tree.add_pair(Target::at("A..B"), null_prob(0.1)).is_err());
        assert!(tree.add_pair(Target::at("A"), null_prob(2.0)).is_err());
        assert_eq!(tree.binding_count(), 0);
    }
}
