//! Static consistency checks over emitted artifacts.
//!
//! The gate reads nothing but artifact text: node ids, anchors and image
//! sources are pulled out of the component with regular expressions, rules
//! and tokens out of the style sheet, and the manifest is parsed as JSON.
//! Every cross-reference between the three files is then checked.

mod extract;
mod report;

pub use report::{Diagnostic, DiagnosticCode, Report};

use extract::{Element, Patterns, StyleSheet};
use loom_codegen::{ArtifactKind, AssetManifest, GeneratedArtifact};
use loom_core::NodeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Validate a set of artifacts with freshly compiled patterns.
pub fn validate(artifacts: &[GeneratedArtifact]) -> Result<Report, ValidateError> {
    Ok(Validator::new()?.validate(artifacts))
}

/// Reusable validator holding compiled patterns.
pub struct Validator {
    patterns: Patterns,
}

impl Validator {
    pub fn new() -> Result<Self, ValidateError> {
        Ok(Self { patterns: Patterns::compile()? })
    }

    pub fn validate(&self, artifacts: &[GeneratedArtifact]) -> Report {
        let mut report = Report::default();

        let find = |kind: ArtifactKind| artifacts.iter().find(|a| a.kind == kind);
        for kind in ArtifactKind::ALL {
            if find(kind).is_none() {
                report.error(DiagnosticCode::MissingArtifact, None, format!("no {kind} artifact was produced"));
            }
        }

        let elements = find(ArtifactKind::Component).map(|a| extract::elements(&self.patterns, &a.content));
        let sheet = find(ArtifactKind::Style).map(|a| extract::style_sheet(&self.patterns, &a.content));
        let manifest = find(ArtifactKind::Manifest).and_then(|a| match AssetManifest::from_json(&a.content) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                report.error(DiagnosticCode::MalformedManifest, None, format!("{}: {err}", a.file_name));
                None
            }
        });

        let nodes: Option<BTreeSet<NodeId>> = elements
            .as_ref()
            .map(|elements| elements.iter().filter_map(|e| e.node.clone()).collect());

        if let Some(sheet) = &sheet {
            check_style(sheet, nodes.as_ref(), elements.as_deref(), &mut report);
        }
        if let Some(manifest) = &manifest {
            check_manifest(manifest, nodes.as_ref(), elements.as_deref(), &mut report);
        }

        debug!(errors = report.errors.len(), warnings = report.warnings.len(), "validated artifacts");
        report
    }
}

fn check_style(
    sheet: &StyleSheet,
    nodes: Option<&BTreeSet<NodeId>>,
    elements: Option<&[Element]>,
    report: &mut Report,
) {
    let overlays: HashMap<&NodeId, bool> = sheet
        .rules
        .iter()
        .map(|rule| (&rule.node, rule.absolute || rule.anchor.is_some()))
        .collect();

    for class in &sheet.malformed {
        report.error(
            DiagnosticCode::MalformedStyleHeader,
            None,
            format!("rule .{class} has an unreadable node header"),
        );
    }

    for rule in &sheet.rules {
        let node = Some(&rule.node);

        if let Some(nodes) = nodes {
            if !nodes.contains(&rule.node) {
                report.error(
                    DiagnosticCode::UnknownStyleNode,
                    node,
                    format!("rule .{} styles a node the component does not render", rule.class),
                );
            }
        }

        match &rule.anchor {
            None if rule.absolute => {
                report.error(DiagnosticCode::MissingAnchor, node, "overlay rule has no anchor");
            }
            None => {}
            Some(anchor) => {
                if nodes.is_some_and(|nodes| !nodes.contains(anchor)) {
                    report.error(
                        DiagnosticCode::UnknownAnchor,
                        node,
                        format!("anchor {anchor} is not rendered by the component"),
                    );
                } else if overlays.get(anchor).copied().unwrap_or(false) {
                    report.error(
                        DiagnosticCode::NestedOverlay,
                        node,
                        format!("anchor {anchor} is itself an overlay"),
                    );
                }
            }
        }

        for var in &rule.vars {
            if !sheet.declared.contains(var) {
                report.error(
                    DiagnosticCode::UndeclaredToken,
                    node,
                    format!("var(--{var}) is not declared in :root"),
                );
            }
        }

        for (attribute, raw) in &rule.unresolved {
            report.warn(
                DiagnosticCode::UnresolvedToken,
                node,
                format!("{attribute} value {raw} matches no token"),
            );
        }
    }

    let Some(elements) = elements else { return };
    let rule_anchors: HashMap<&NodeId, Option<&NodeId>> =
        sheet.rules.iter().map(|rule| (&rule.node, rule.anchor.as_ref())).collect();
    for element in elements {
        let Some(node) = &element.node else { continue };
        let Some(style_anchor) = rule_anchors.get(node).copied() else { continue };
        match (&element.anchor, style_anchor) {
            (Some(_), None) => {
                report.error(DiagnosticCode::MissingAnchor, Some(node), "overlay element has no anchored rule");
            }
            (Some(markup), Some(style)) if markup != style => {
                report.error(
                    DiagnosticCode::AnchorMismatch,
                    Some(node),
                    format!("component anchors to {markup} but the style sheet anchors to {style}"),
                );
            }
            _ => {}
        }
    }
}

fn check_manifest(
    manifest: &AssetManifest,
    nodes: Option<&BTreeSet<NodeId>>,
    elements: Option<&[Element]>,
    report: &mut Report,
) {
    let mut by_name: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for entry in &manifest.assets {
        let fingerprint = entry.fingerprint.as_deref();
        match by_name.get(entry.file_name.as_str()) {
            Some(previous) if *previous != fingerprint => {
                report.error(
                    DiagnosticCode::ConflictingAsset,
                    None,
                    format!("{} is listed with different fingerprints", entry.file_name),
                );
            }
            Some(_) => {}
            None => {
                by_name.insert(entry.file_name.as_str(), fingerprint);
            }
        }

        if let Some(nodes) = nodes {
            for node in entry.nodes.iter().filter(|node| !nodes.contains(node)) {
                report.error(
                    DiagnosticCode::UnknownManifestNode,
                    Some(node),
                    format!("{} is used by a node the component does not render", entry.file_name),
                );
            }
        }

        if let Some(reason) = &entry.placeholder {
            for node in &entry.nodes {
                report.warn(
                    DiagnosticCode::PlaceholderAsset,
                    Some(node),
                    format!("image replaced by {}: {reason}", entry.file_name),
                );
            }
        }
    }

    let Some(elements) = elements else { return };
    let paths: BTreeSet<&str> = manifest.assets.iter().map(|entry| entry.path.as_str()).collect();
    let mut owner: Option<&NodeId> = None;
    for element in elements {
        if element.node.is_some() {
            owner = element.node.as_ref();
        }
        let Some(src) = &element.src else { continue };
        if !paths.contains(src.as_str()) {
            report.error(
                DiagnosticCode::UnknownImageSource,
                owner,
                format!("image source {src} is not listed in the manifest"),
            );
        }
    }
}
