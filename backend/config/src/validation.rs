//! Path-aware validation walker.
//!
//! Every node type implements [`Validate`]: `validate` checks the node's own
//! fields and reports paths relative to the node, `children` declares the
//! nested nodes to visit. [`validate_node`] walks the tree pre-order in the
//! declared order, re-roots each local report under the node's path and never
//! stops early, so one pass surfaces every problem.

use crate::path::{ContextPath, Segment};
use crate::report::Report;

/// A node in a config tree that can be checked.
pub trait Validate {
    /// Local contract of this node. Paths are relative to the node.
    fn validate(&self) -> Report {
        Report::new()
    }

    /// Declare child nodes in declaration order.
    fn children<'a>(&'a self, _children: &mut Children<'a>) {}
}

/// Child nodes collected by [`Validate::children`].
#[derive(Default)]
pub struct Children<'a> {
    nodes: Vec<(ContextPath, &'a dyn Validate)>,
}

impl<'a> Children<'a> {
    /// A child that is always present.
    pub fn field(&mut self, name: &str, node: &'a dyn Validate) {
        self.nodes.push((ContextPath::root().append(name), node));
    }

    /// An optional child; skipped when absent.
    pub fn optional<T: Validate>(&mut self, name: &str, node: &'a Option<T>) {
        if let Some(node) = node {
            self.field(name, node);
        }
    }

    /// An optional list; elements are visited in index order.
    pub fn list<T: Validate>(&mut self, name: &str, items: &'a Option<Vec<T>>) {
        let Some(items) = items else { return };
        let base = ContextPath::root().append(name);
        for (i, item) in items.iter().enumerate() {
            self.nodes.push((base.append(Segment::Index(i)), item));
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Validate `node` and everything beneath it, with paths rooted at `at`.
pub fn validate_node(node: &dyn Validate, at: &ContextPath) -> Report {
    let mut report = node.validate().rooted_at(at);

    let mut children = Children::default();
    node.children(&mut children);
    for (relative, child) in children.nodes {
        report.merge(validate_node(child, &at.join(&relative)));
    }
    report
}
