//! Component and class naming.

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use loom_core::{DesignDocument, NodeId};
use std::collections::HashSet;

const FALLBACK_COMPONENT: &str = "Design";

/// PascalCase component name; falls back to `Design` when nothing usable
/// remains.
pub fn component_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let name = cleaned.to_case(Case::Pascal);

    match name.chars().next() {
        None => FALLBACK_COMPONENT.to_string(),
        Some(first) if first.is_ascii_digit() => format!("{FALLBACK_COMPONENT}{name}"),
        Some(_) => name,
    }
}

/// CSS class per node: `n-` plus the sanitised identifier. Identifiers that
/// sanitise to the same class get `-2`, `-3`, ... in traversal order.
#[derive(Debug, Clone, Default)]
pub struct ClassNames {
    classes: IndexMap<NodeId, String>,
}

impl ClassNames {
    pub fn assign(doc: &DesignDocument) -> Self {
        let mut taken = HashSet::new();
        let mut classes = IndexMap::new();

        for visit in doc.depth_first() {
            let base = format!("n-{}", sanitize(visit.node.id.as_str()));
            let mut class = base.clone();
            let mut suffix = 2;
            while !taken.insert(class.clone()) {
                class = format!("{base}-{suffix}");
                suffix += 1;
            }
            classes.insert(visit.node.id.clone(), class);
        }

        Self { classes }
    }

    pub fn get(&self, node: &NodeId) -> Option<&str> {
        self.classes.get(node).map(String::as_str)
    }
}

fn sanitize(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if sanitized.is_empty() {
        "node".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::{Bounds, DesignNode, NodeKind};

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("product card"), "ProductCard");
        assert_eq!(component_name("Home / Hero"), "HomeHero");
        assert_eq!(component_name("404 page"), "Design404Page");
        assert_eq!(component_name("!!!"), "Design");
    }

    #[test]
    fn test_class_collisions() {
        let root = DesignNode::new("root", NodeKind::Frame, Bounds::default())
            .with_child(DesignNode::new("1:2", NodeKind::Frame, Bounds::default()))
            .with_child(DesignNode::new("1-2", NodeKind::Frame, Bounds::default()))
            .with_child(DesignNode::new("1;2", NodeKind::Frame, Bounds::default()));
        let names = ClassNames::assign(&DesignDocument::new("Doc", root));

        assert_eq!(names.get(&NodeId::from("root")), Some("n-root"));
        assert_eq!(names.get(&NodeId::from("1:2")), Some("n-1-2"));
        assert_eq!(names.get(&NodeId::from("1-2")), Some("n-1-2-2"));
        assert_eq!(names.get(&NodeId::from("1;2")), Some("n-1-2-3"));
    }
}
