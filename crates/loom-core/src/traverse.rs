//! Depth-first traversal of the design tree.
//!
//! Every pass walks the tree through this iterator so that node order in the
//! emitted component, the style sheet and the asset manifest agree.

use crate::ast::DesignNode;

/// A node reached during traversal.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub node: &'a DesignNode,
    pub parent: Option<&'a DesignNode>,
    /// Distance from the traversal root (root = 0).
    pub depth: usize,
    /// Position among the parent's children (root = 0).
    pub index: usize,
}

impl<'a> Visit<'a> {
    /// Children of the parent, i.e. this node and its siblings.
    pub fn siblings(&self) -> &'a [DesignNode] {
        match self.parent {
            Some(parent) => &parent.children,
            None => std::slice::from_ref(self.node),
        }
    }
}

/// Pre-order iterator, children visited in source order.
///
/// Uses an explicit stack, so deep trees do not grow the call stack.
pub struct DepthFirst<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> DepthFirst<'a> {
    pub fn new(root: &'a DesignNode) -> Self {
        Self {
            stack: vec![Visit { node: root, parent: None, depth: 0, index: 0 }],
        }
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        let node = visit.node;
        self.stack.extend(node.children.iter().enumerate().rev().map(|(index, child)| Visit {
            node: child,
            parent: Some(node),
            depth: visit.depth + 1,
            index,
        }));
        Some(visit)
    }
}
