//! CSS module emission.
//!
//! A `:root` block declares every token a rule refers to, followed by one
//! rule per node in traversal order. Token-bound values are `var()`
//! references; values outside the vocabulary are written literally and
//! flagged with an `UNRESOLVED` comment.

use crate::error::{CodegenError, Result};
use crate::escape::{comment, comment_json, css_string};
use crate::names::ClassNames;
use loom_core::{Color, DesignDocument, NodeKind, StyleAttribute, Viewport, Visit};
use loom_layout::{Axis, LayoutMap, LayoutSpec, Positioning, Spacing};
use loom_resolver::{NodeBindings, TokenBindings, TokenRef, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub(crate) struct StyleEmitter<'a> {
    pub bindings: &'a TokenBindings,
    pub layouts: &'a LayoutMap,
    pub classes: &'a ClassNames,
    pub viewport: Viewport,
}

/// Declarations of one rule, in emission order.
#[derive(Default)]
struct Rule {
    lines: Vec<String>,
}

impl Rule {
    fn push(&mut self, property: &str, value: impl AsRef<str>) {
        self.lines.push(format!("  {property}: {};", value.as_ref()));
    }

    fn push_unresolved(&mut self, property: &str, value: &str, attribute: StyleAttribute, raw: &Value) {
        self.lines.push(format!(
            "  {property}: {value}; /* UNRESOLVED {attribute} {} */",
            comment(&raw.to_string())
        ));
    }
}

impl<'a> StyleEmitter<'a> {
    pub fn render(&self, doc: &DesignDocument) -> Result<String> {
        let mut tokens: BTreeMap<String, String> = BTreeMap::new();
        let mut rules = String::new();

        for visit in doc.depth_first() {
            let layout = self
                .layouts
                .get(&visit.node.id)
                .ok_or_else(|| CodegenError::MissingLayout(visit.node.id.clone()))?;
            let rule = self.rule(&visit, layout, &mut tokens);

            let class = self.classes.get(&visit.node.id).unwrap_or("n-node");
            let _ = write!(rules, "/* node: {}", comment_json(visit.node.id.as_str()));
            if let Some(anchor) = layout.positioning.anchor() {
                let _ = write!(rules, " anchor: {}", comment_json(anchor.as_str()));
            }
            let _ = writeln!(rules, " */");
            let _ = writeln!(rules, ".{class} {{");
            for line in &rule.lines {
                let _ = writeln!(rules, "{line}");
            }
            let _ = writeln!(rules, "}}\n");
        }

        let mut css = String::new();
        let _ = writeln!(css, "/* Generated by loom from {}. Do not edit. */", comment(&css_string(&doc.name)));
        let _ = writeln!(css, ":root {{");
        for (name, value) in &tokens {
            let _ = writeln!(css, "  --{name}: {value};");
        }
        let _ = writeln!(css, "}}\n");
        css.push_str(rules.trim_end());
        css.push('\n');
        Ok(css)
    }

    fn rule(&self, visit: &Visit<'_>, layout: &LayoutSpec, tokens: &mut BTreeMap<String, String>) -> Rule {
        let node = visit.node;
        let mut rule = Rule::default();

        if node.kind == NodeKind::Frame || !node.children.is_empty() {
            rule.push("display", "flex");
            rule.push("flex-direction", layout.axis.as_str());
            if !layout.gap.is_zero() {
                rule.push("gap", self.spacing(&layout.gap, tokens));
            }
            if !layout.padding.is_zero() {
                let sides: Vec<String> =
                    layout.padding.sides().iter().map(|side| self.spacing(side, tokens)).collect();
                rule.push("padding", sides.join(" "));
            }
        }

        let hosts_overlay = node
            .children
            .iter()
            .any(|child| self.layouts.get(&child.id).is_some_and(LayoutSpec::is_overlay));
        if hosts_overlay && !layout.is_overlay() {
            rule.push("position", "relative");
        }

        let parent_axis = visit
            .parent
            .and_then(|parent| self.layouts.get(&parent.id))
            .map(|parent| parent.axis);

        let mut omit_width = false;
        let mut omit_height = false;
        match &layout.positioning {
            Positioning::Overlay { offset, origin, .. } => {
                rule.push("position", "absolute");
                rule.push("left", self.length(origin.x.value() + offset.x.value()));
                rule.push("top", self.length(origin.y.value() + offset.y.value()));
            }
            Positioning::Flow => {
                if let Some(axis) = parent_axis {
                    rule.push("align-self", layout.alignment.as_css());
                    if let Some(spacing) = layout.spacing_before.as_ref().filter(|s| !s.is_zero()) {
                        let property = match axis {
                            Axis::Row => "margin-left",
                            Axis::Column => "margin-top",
                        };
                        rule.push(property, self.spacing(spacing, tokens));
                    }
                    if layout.alignment == loom_layout::Alignment::Stretch {
                        match axis {
                            Axis::Row => omit_height = true,
                            Axis::Column => omit_width = true,
                        }
                    }
                }
            }
        }

        if !omit_width {
            rule.push("width", layout.size.width.to_string());
        }
        if !omit_height {
            rule.push("height", layout.size.height.to_string());
        }

        let bindings = self.bindings.get(&node.id);
        if let Some(fill) = node.style.fill {
            let property = if node.kind == NodeKind::Text { "color" } else { "background-color" };
            self.color(&mut rule, property, StyleAttribute::Fill, fill, bindings, tokens, "");
        }
        if let Some(stroke) = node.style.stroke {
            let width = self.length_of(node.style.stroke_width.unwrap_or(1.0));
            let prefix = format!("{width} solid ");
            self.color(&mut rule, "border", StyleAttribute::Stroke, stroke, bindings, tokens, &prefix);
        }
        if let Some(radius) = node.style.corner_radius.filter(|r| *r > 0.0) {
            rule.push("border-radius", self.length_of(radius));
        }
        if let Some(opacity) = node.style.opacity.filter(|o| *o < 1.0) {
            rule.push("opacity", Value::Length(opacity).to_string());
        }
        if let Some(family) = &node.style.font_family {
            rule.push("font-family", css_string(family));
        }
        if let Some(size) = node.style.font_size {
            match bindings.and_then(|b| b.get(&StyleAttribute::FontSize)).and_then(|b| b.token()) {
                Some(token) => rule.push("font-size", self.token(token, tokens)),
                None => rule.push_unresolved(
                    "font-size",
                    &self.length_of(size),
                    StyleAttribute::FontSize,
                    &Value::Length(size),
                ),
            }
        }
        if let Some(weight) = node.style.font_weight {
            rule.push("font-weight", weight.to_string());
        }

        rule
    }

    #[allow(clippy::too_many_arguments)]
    fn color(
        &self,
        rule: &mut Rule,
        property: &str,
        attribute: StyleAttribute,
        raw: Color,
        bindings: Option<&NodeBindings>,
        tokens: &mut BTreeMap<String, String>,
        prefix: &str,
    ) {
        match bindings.and_then(|b| b.get(&attribute)).and_then(|b| b.token()) {
            Some(token) => rule.push(property, format!("{prefix}{}", self.token(token, tokens))),
            None => rule.push_unresolved(
                property,
                &format!("{prefix}{}", raw.to_hex()),
                attribute,
                &Value::Color(raw),
            ),
        }
    }

    fn token(&self, token: &TokenRef, tokens: &mut BTreeMap<String, String>) -> String {
        let value = match token.value {
            Value::Color(color) => color.to_hex(),
            Value::Length(length) => self.length_of(length),
        };
        tokens.insert(token.name.clone(), value);
        format!("var(--{})", token.name)
    }

    fn spacing(&self, spacing: &Spacing, tokens: &mut BTreeMap<String, String>) -> String {
        match spacing {
            Spacing::Zero => "0".to_string(),
            Spacing::Step { token, step } => {
                tokens.insert(token.clone(), self.length_of(*step));
                format!("var(--{token})")
            }
        }
    }

    fn length_of(&self, design_units: f64) -> String {
        self.viewport.to_responsive(design_units).to_string()
    }

    fn length(&self, vw: f64) -> String {
        loom_core::ResponsiveLength::vw(vw).to_string()
    }
}
