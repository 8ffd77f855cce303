//! Template engine for code generation.

use crate::error::{CodegenError, Result};
use handlebars::Handlebars;
use serde::Serialize;

pub(crate) const COMPONENT: &str = "component";

const COMPONENT_TEMPLATE: &str = r#"// Generated by loom from "{{{source}}}". Do not edit.
import styles from './{{style_file}}';

export function {{name}}() {
  return (
{{{indent body 4}}}
  );
}

export default {{name}};
"#;

/// Template engine using Handlebars.
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> TemplateEngine<'a> {
    /// Create a template engine with the built-in templates registered.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        Self::register_helpers(&mut handlebars);

        let mut engine = Self { handlebars };
        engine.register_template(COMPONENT, COMPONENT_TEMPLATE)?;
        Ok(engine)
    }

    /// Register a template.
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(CodegenError::InvalidTemplate)?;
        Ok(())
    }

    /// Render a template.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.handlebars
            .render(name, data)
            .map_err(CodegenError::TemplateError)
    }

    fn register_helpers(handlebars: &mut Handlebars) {
        // Indent every non-empty line of a block
        handlebars.register_helper(
            "indent",
            Box::new(
                |h: &handlebars::Helper,
                 _r: &Handlebars,
                 _ctx: &handlebars::Context,
                 _rc: &mut handlebars::RenderContext,
                 out: &mut dyn handlebars::Output| {
                    let content = h
                        .param(0)
                        .and_then(|v| v.value().as_str())
                        .unwrap_or("");
                    let spaces = h
                        .param(1)
                        .and_then(|v| v.value().as_u64())
                        .unwrap_or(2) as usize;

                    let indent = " ".repeat(spaces);
                    let indented = content
                        .lines()
                        .map(|line| {
                            if line.trim().is_empty() {
                                String::new()
                            } else {
                                format!("{}{}", indent, line)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    out.write(&indented)?;
                    Ok(())
                },
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_template() {
        let engine = TemplateEngine::new().unwrap();
        let out = engine
            .render(
                COMPONENT,
                &json!({
                    "source": "Card",
                    "style_file": "Card.module.css",
                    "name": "Card",
                    "body": "<div>\n  <p>{\"a & b\"}</p>\n</div>",
                }),
            )
            .unwrap();

        assert!(out.contains("import styles from './Card.module.css';"));
        assert!(out.contains("export function Card() {"));
        assert!(out.contains("    <div>\n      <p>{\"a & b\"}</p>\n    </div>\n  );"));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.render(COMPONENT, &json!({ "name": "Card" })).is_err());
    }
}
