//! React component emission.
//!
//! One JSX element per design node, mirroring the tree. Frames and any node
//! with children become `div` containers; leaves map by kind.

use crate::error::{CodegenError, Result};
use crate::escape::html_attr;
use crate::manifest::asset_path;
use crate::names::ClassNames;
use crate::templates::{TemplateEngine, COMPONENT};
use loom_assets::AssetSet;
use loom_core::{DesignDocument, DesignNode, NodeKind};
use loom_layout::LayoutMap;
use serde::Serialize;

#[derive(Serialize)]
struct ComponentData<'a> {
    source: String,
    style_file: &'a str,
    name: &'a str,
    body: String,
}

pub(crate) struct ComponentEmitter<'a> {
    pub layouts: &'a LayoutMap,
    pub assets: &'a AssetSet,
    pub classes: &'a ClassNames,
}

impl<'a> ComponentEmitter<'a> {
    pub fn render(&self, doc: &DesignDocument, name: &str, style_file: &str) -> Result<String> {
        let mut body = String::new();
        self.element(&doc.root, 0, &mut body)?;

        let engine = TemplateEngine::new()?;
        engine.render(
            COMPONENT,
            &ComponentData {
                source: doc.name.replace(['\n', '\r'], " "),
                style_file,
                name,
                body,
            },
        )
    }

    fn element(&self, node: &DesignNode, depth: usize, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(depth);
        let layout = self
            .layouts
            .get(&node.id)
            .ok_or_else(|| CodegenError::MissingLayout(node.id.clone()))?;

        let mut attrs = Vec::new();
        if let Some(class) = self.classes.get(&node.id) {
            attrs.push(format!("className={{styles[\"{class}\"]}}"));
        }
        attrs.push(format!("data-node=\"{}\"", html_attr(node.id.as_str())));

        let container = node.kind == NodeKind::Frame || !node.children.is_empty();
        if container {
            attrs.push(format!("data-layout=\"{}\"", layout.axis.as_str()));
        }
        if let Some(anchor) = layout.positioning.anchor() {
            attrs.push(format!("data-anchor=\"{}\"", html_attr(anchor.as_str())));
        }
        if node.kind == NodeKind::Vector {
            attrs.push("aria-hidden=\"true\"".to_string());
        }

        let src = match &node.image {
            Some(_) if node.kind.renders_image() => {
                let record = self
                    .assets
                    .record_for(&node.id)
                    .ok_or_else(|| CodegenError::MissingAsset(node.id.clone()))?;
                Some(asset_path(&record.file_name))
            }
            _ => None,
        };
        let alt = html_attr(node.name.as_deref().unwrap_or(""));
        let text = match (node.kind, &node.text) {
            (NodeKind::Text, Some(text)) => Some(serde_json::to_string(text)?),
            _ => None,
        };

        let attrs = attrs.join(" ");

        if !container {
            let line = match (node.kind, &src, &text) {
                (NodeKind::Text, _, Some(text)) => format!("{indent}<p {attrs}>{{{text}}}</p>"),
                (NodeKind::Text, _, None) => format!("{indent}<p {attrs} />"),
                (_, Some(src), _) => {
                    format!("{indent}<img {attrs} src=\"{}\" alt=\"{alt}\" />", html_attr(src))
                }
                _ => format!("{indent}<div {attrs} />"),
            };
            out.push_str(&line);
            out.push('\n');
            return Ok(());
        }

        if node.children.is_empty() && src.is_none() && text.is_none() {
            out.push_str(&format!("{indent}<div {attrs} />\n"));
            return Ok(());
        }

        out.push_str(&format!("{indent}<div {attrs}>\n"));
        let inner = "  ".repeat(depth + 1);
        if let Some(src) = &src {
            out.push_str(&format!("{inner}<img src=\"{}\" alt=\"{alt}\" />\n", html_attr(src)));
        }
        if let Some(text) = &text {
            out.push_str(&format!("{inner}{{{text}}}\n"));
        }
        for child in &node.children {
            self.element(child, depth + 1, out)?;
        }
        out.push_str(&format!("{indent}</div>\n"));
        Ok(())
    }
}
