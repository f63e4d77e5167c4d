//! RouteInfo - Immutable Route Position Nodes
//!
//! A resolved route position is a singly-linked chain of `RouteInfo` nodes,
//! each pointing at its parent. Nodes are immutable once constructed, so
//! consecutive transitions can share substructure freely: a transition's
//! `to` is the leafmost node, `from` the leaf of the previous position.

use std::collections::BTreeMap;
use std::sync::Arc;

/// One level of a resolved route position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    name: String,
    params: BTreeMap<String, String>,
    parent: Option<Arc<RouteInfo>>,
}

impl RouteInfo {
    /// Create a root node with no parent.
    pub fn root(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            params: BTreeMap::new(),
            parent: None,
        })
    }

    /// Create a child of `self` with no params.
    pub fn child(self: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        self.child_with(name, BTreeMap::new())
    }

    /// Create a child of `self` carrying dynamic segment params.
    pub fn child_with(
        self: &Arc<Self>,
        name: impl Into<String>,
        params: BTreeMap<String, String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            params,
            parent: Some(self.clone()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn parent(&self) -> Option<&Arc<RouteInfo>> {
        self.parent.as_ref()
    }

    /// Iterate from this node up to the root, starting with `self`.
    pub fn ancestors(self: &Arc<Self>) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// Find the nearest node (self included) with the given name.
    pub fn find(self: &Arc<Self>, name: &str) -> Option<Arc<RouteInfo>> {
        self.ancestors().find(|node| node.name() == name)
    }

    /// Number of nodes between this one and the root, root included.
    pub fn depth(self: &Arc<Self>) -> usize {
        self.ancestors().count()
    }
}

/// Leaf-to-root iterator over a route position chain.
pub struct Ancestors {
    next: Option<Arc<RouteInfo>>,
}

impl Iterator for Ancestors {
    type Item = Arc<RouteInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent.clone();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chain() -> Arc<RouteInfo> {
        let mut params = BTreeMap::new();
        params.insert("post_id".to_string(), "42".to_string());
        RouteInfo::root("app")
            .child("posts")
            .child_with("post", params)
    }

    #[test]
    fn test_ancestors_walk_leaf_to_root() {
        let leaf = sample_chain();
        let names: Vec<_> = leaf
            .ancestors()
            .map(|node| node.name().to_string())
            .collect();

        assert_eq!(names, ["post", "posts", "app"]);
        assert_eq!(leaf.depth(), 3);
    }

    #[test]
    fn test_find_and_params() {
        let leaf = sample_chain();

        assert_eq!(leaf.param("post_id"), Some("42"));
        assert!(leaf.find("posts").is_some());
        assert!(leaf.find("admin").is_none());
        assert!(leaf.find("posts").unwrap().parent().is_some());
    }

    #[test]
    fn test_structural_sharing() {
        let trunk = RouteInfo::root("app").child("posts");
        let a = trunk.child("index");
        let b = trunk.child("post");

        assert!(Arc::ptr_eq(
            a.parent().unwrap(),
            b.parent().unwrap()
        ));
    }
}
