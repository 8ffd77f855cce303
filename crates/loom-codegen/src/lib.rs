//! Code emission for Loom.
//!
//! Turns a design document together with its token bindings, inferred
//! layout and materialized assets into three artifacts:
//!
//! - a React function component (`<Name>.tsx`)
//! - a CSS module with the token declarations and one rule per node
//!   (`<Name>.module.css`)
//! - an asset manifest (`<Name>.assets.json`)
//!
//! Emission is pure: the same inputs always produce byte-identical output.

mod artifact;
mod component;
pub mod error;
pub mod escape;
mod manifest;
mod names;
mod stylesheet;
mod templates;

pub use artifact::{ArtifactKind, EmitOptions, GeneratedArtifact};
pub use error::{CodegenError, Result};
pub use manifest::{asset_path, AssetManifest, ManifestEntry, ASSET_DIR, MANIFEST_VERSION};
pub use names::{component_name, ClassNames};
pub use templates::TemplateEngine;

use component::ComponentEmitter;
use loom_assets::AssetSet;
use loom_core::{DesignDocument, Viewport};
use loom_layout::LayoutMap;
use loom_resolver::TokenBindings;
use stylesheet::StyleEmitter;
use tracing::debug;

/// Emit the component, style sheet and manifest of a document.
pub fn emit(
    doc: &DesignDocument,
    bindings: &TokenBindings,
    layouts: &LayoutMap,
    assets: &AssetSet,
    viewport: Viewport,
    options: &EmitOptions,
) -> Result<Vec<GeneratedArtifact>> {
    let name = component_name(options.component_name.as_deref().unwrap_or(&doc.name));
    let classes = ClassNames::assign(doc);
    let style_file = format!("{name}{}", ArtifactKind::Style.suffix());

    let component = ComponentEmitter { layouts, assets, classes: &classes }.render(doc, &name, &style_file)?;
    let style = StyleEmitter { bindings, layouts, classes: &classes, viewport }.render(doc)?;
    let manifest = AssetManifest::from_assets(assets).to_json()?;

    debug!(component = %name, nodes = layouts.len(), assets = assets.len(), "emitted artifacts");

    Ok(vec![
        GeneratedArtifact::new(ArtifactKind::Component, &name, component),
        GeneratedArtifact::new(ArtifactKind::Style, &name, style),
        GeneratedArtifact::new(ArtifactKind::Manifest, &name, manifest),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::{
        Bounds, Color, DesignNode, LayoutTolerances, NodeKind, PaletteEntry, Style, TokenVocabulary,
    };
    use loom_layout::{infer_tree, LayoutContext};
    use loom_resolver::resolve_tree;

    fn vocab() -> TokenVocabulary {
        TokenVocabulary {
            palette: vec![
                PaletteEntry { name: "ink".into(), color: Color::rgb(17, 24, 39) },
                PaletteEntry { name: "white".into(), color: Color::rgb(255, 255, 255) },
            ],
            color_threshold: 2.0,
            spacing_steps: vec![4.0, 8.0, 16.0, 24.0],
            font_steps: vec![12.0, 14.0, 16.0],
            viewport: Viewport::new(1440.0),
        }
    }

    fn document() -> DesignDocument {
        let card = DesignNode::new("card", NodeKind::Frame, Bounds::new(0.0, 0.0, 320.0, 200.0))
            .with_style(Style { fill: Some(Color::rgb(255, 255, 255)), corner_radius: Some(8.0), ..Style::default() })
            .with_child(
                DesignNode::new("title", NodeKind::Text, Bounds::new(16.0, 16.0, 288.0, 20.0))
                    .with_text("Hello \"world\"")
                    .with_style(Style {
                        fill: Some(Color::rgb(17, 24, 39)),
                        font_size: Some(13.0),
                        font_family: Some("Inter".into()),
                        ..Style::default()
                    }),
            )
            .with_child(
                DesignNode::new("accent", NodeKind::Vector, Bounds::new(16.0, 52.0, 288.0, 4.0))
                    .with_style(Style { fill: Some(Color::rgb(200, 30, 30)), ..Style::default() }),
            )
            .with_child(DesignNode::new("badge", NodeKind::Frame, Bounds::new(290.0, 10.0, 20.0, 20.0)));
        DesignDocument::new("product card", card)
    }

    fn emit_document(doc: &DesignDocument) -> Vec<GeneratedArtifact> {
        let vocab = vocab();
        let tolerances =
            LayoutTolerances { overlap_epsilon: 0.01, row_overlap_threshold: 0.5, align_epsilon: 0.02 };
        let bindings = resolve_tree(doc, &vocab);
        let layouts = infer_tree(doc, &LayoutContext::new(&vocab, tolerances)).unwrap();
        emit(doc, &bindings, &layouts, &AssetSet::default(), vocab.viewport, &EmitOptions::default()).unwrap()
    }

    #[test]
    fn test_artifact_names() {
        let artifacts = emit_document(&document());
        let names: Vec<_> = artifacts.iter().map(|a| (a.kind, a.file_name.as_str())).collect();
        assert_eq!(
            names,
            vec![
                (ArtifactKind::Component, "ProductCard.tsx"),
                (ArtifactKind::Style, "ProductCard.module.css"),
                (ArtifactKind::Manifest, "ProductCard.assets.json"),
            ]
        );
    }

    #[test]
    fn test_component_mirrors_tree() {
        let artifacts = emit_document(&document());
        let tsx = &artifacts[0].content;

        assert!(tsx.contains("import styles from './ProductCard.module.css';"));
        assert!(tsx.contains("export function ProductCard() {"));
        assert!(tsx.contains(r#"<div className={styles["n-card"]} data-node="card" data-layout="column">"#));
        assert!(tsx.contains(r#"<p className={styles["n-title"]} data-node="title">{"Hello \"world\""}</p>"#));
        assert!(tsx.contains(r#"<div className={styles["n-accent"]} data-node="accent" aria-hidden="true" />"#));
        assert!(tsx.contains(r#"data-node="badge" data-layout="column" data-anchor="title" />"#));
    }

    #[test]
    fn test_stylesheet_tokens_and_unresolved() {
        let artifacts = emit_document(&document());
        let css = &artifacts[1].content;

        assert!(css.contains(":root {\n  --color-ink: #111827;\n  --color-white: #ffffff;\n  --font-12: 0.8333vw;\n"));
        assert!(css.contains("/* node: \"card\" */\n.n-card {\n  display: flex;\n  flex-direction: column;\n"));
        assert!(css.contains("  position: relative;\n"));
        assert!(css.contains("  background-color: var(--color-white);\n"));
        assert!(css.contains("  color: var(--color-ink);\n"));
        assert!(css.contains("  font-size: var(--font-12);\n"));
        assert!(css.contains("  background-color: #c81e1e; /* UNRESOLVED fill #c81e1e */\n"));
        assert!(css.contains(
            "/* node: \"badge\" anchor: \"title\" */\n.n-badge {\n  display: flex;\n  flex-direction: column;\n  position: absolute;\n"
        ));
        assert!(css.contains("  font-family: \"Inter\";\n"));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let doc = document();
        assert_eq!(emit_document(&doc), emit_document(&doc));
    }
}
