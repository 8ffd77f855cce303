//! Engine configuration and the token vocabulary.
//!
//! The color threshold, step scales and layout tolerances have no built-in
//! defaults: they describe a particular design system and must be supplied by
//! the caller. Only fetch tuning knobs fall back to defaults.

use crate::color::Color;
use crate::errors::ConfigError;
use crate::units::Viewport;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Configuration recognised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum LAB distance for a nearest palette match (inclusive).
    #[serde(alias = "colorThreshold")]
    pub color_threshold: f64,
    /// Allowed spacing values in design units, ascending.
    #[serde(alias = "spacingSteps")]
    pub spacing_steps: Vec<f64>,
    /// Allowed font sizes in design units, ascending.
    #[serde(alias = "fontSteps")]
    pub font_steps: Vec<f64>,
    /// Retries after the first failed fetch attempt.
    #[serde(alias = "maxFetchRetries")]
    pub max_fetch_retries: u32,
    /// Timeout of a single fetch attempt.
    #[serde(alias = "fetchTimeoutMs")]
    pub fetch_timeout_ms: u64,
    /// Named palette colors, in declaration order.
    pub palette: IndexMap<String, String>,
    /// Width of the viewport the design was drawn for.
    #[serde(alias = "viewportWidth")]
    pub viewport_width: f64,
    pub layout: LayoutTolerances,
    #[serde(default)]
    pub fetch: FetchTuning,
}

/// Geometry tolerances used by layout inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutTolerances {
    /// Fraction of the smaller box's area two siblings may share before the
    /// later one becomes an overlay.
    #[serde(alias = "overlapEpsilon")]
    pub overlap_epsilon: f64,
    /// Fraction of the shorter sibling's height that must be shared
    /// vertically by every pair for the siblings to form a row.
    #[serde(alias = "rowOverlapThreshold")]
    pub row_overlap_threshold: f64,
    /// Fraction of the parent's cross extent tolerated when deciding
    /// stretch and center alignment.
    #[serde(alias = "alignEpsilon")]
    pub align_epsilon: f64,
}

/// Concurrency and backoff knobs of the asset fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchTuning {
    #[serde(alias = "maxConcurrentFetches")]
    pub max_concurrent_fetches: usize,
    #[serde(alias = "backoffBaseMs")]
    pub backoff_base_ms: u64,
    #[serde(alias = "backoffMaxMs")]
    pub backoff_max_ms: u64,
}

impl Default for FetchTuning {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            backoff_base_ms: 100,
            backoff_max_ms: 5_000,
        }
    }
}

/// Category of a design token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Color,
    FontSize,
    Spacing,
}

/// One named palette color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub name: String,
    pub color: Color,
}

impl PaletteEntry {
    /// Custom property name, e.g. `color-primary`.
    pub fn token_name(&self) -> String {
        format!("color-{}", self.name)
    }
}

/// The closed, validated token vocabulary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenVocabulary {
    pub palette: Vec<PaletteEntry>,
    pub color_threshold: f64,
    pub spacing_steps: Vec<f64>,
    pub font_steps: Vec<f64>,
    pub viewport: Viewport,
}

impl TokenVocabulary {
    /// Custom property name of a spacing step, e.g. `space-16`.
    pub fn spacing_token(step: f64) -> String {
        format!("space-{}", step_label(step))
    }

    /// Custom property name of a font step, e.g. `font-14`.
    pub fn font_token(step: f64) -> String {
        format!("font-{}", step_label(step))
    }
}

fn step_label(step: f64) -> String {
    let text = format!("{step:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.replace('.', "_")
}

impl EngineConfig {
    /// Validate the configuration and build the token vocabulary.
    pub fn vocabulary(&self) -> Result<TokenVocabulary, ConfigError> {
        if !self.color_threshold.is_finite() || self.color_threshold < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "color_threshold",
                value: self.color_threshold,
            });
        }
        if !self.viewport_width.is_finite() || self.viewport_width <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "viewport_width",
                value: self.viewport_width,
            });
        }
        check_steps("spacing_steps", &self.spacing_steps)?;
        check_steps("font_steps", &self.font_steps)?;
        self.layout.validate()?;

        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "fetch_timeout_ms",
                value: 0.0,
            });
        }
        if self.fetch.max_concurrent_fetches == 0 {
            return Err(ConfigError::OutOfRange {
                field: "fetch.max_concurrent_fetches",
                value: 0.0,
            });
        }

        let palette = self
            .palette
            .iter()
            .map(|(name, value)| {
                if name.is_empty()
                    || !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                {
                    return Err(ConfigError::InvalidTokenName { name: name.clone() });
                }
                let color = Color::parse(value).ok_or_else(|| ConfigError::InvalidPaletteColor {
                    name: name.clone(),
                    value: value.clone(),
                })?;
                Ok(PaletteEntry { name: name.clone(), color })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TokenVocabulary {
            palette,
            color_threshold: self.color_threshold,
            spacing_steps: self.spacing_steps.clone(),
            font_steps: self.font_steps.clone(),
            viewport: Viewport::new(self.viewport_width),
        })
    }
}

impl LayoutTolerances {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("layout.overlap_epsilon", self.overlap_epsilon),
            ("layout.row_overlap_threshold", self.row_overlap_threshold),
            ("layout.align_epsilon", self.align_epsilon),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

fn check_steps(field: &'static str, steps: &[f64]) -> Result<(), ConfigError> {
    if steps.is_empty() {
        return Err(ConfigError::EmptySteps { field });
    }
    let mut previous: Option<f64> = None;
    for &value in steps {
        let ordered = previous.map_or(true, |prev| value > prev);
        if !value.is_finite() || value < 0.0 || !ordered {
            return Err(ConfigError::UnorderedSteps { field, value });
        }
        previous = Some(value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "color_threshold": 5.0,
            "spacing_steps": [4, 8, 16, 24],
            "font_steps": [12, 14, 16, 20, 24],
            "max_fetch_retries": 2,
            "fetch_timeout_ms": 1000,
            "palette": { "primary": "#3b82f6", "ink": "#111827" },
            "viewport_width": 1440,
            "layout": { "overlap_epsilon": 0.01, "row_overlap_threshold": 0.5, "align_epsilon": 0.02 }
        })
    }

    #[test]
    fn test_config_deserializes_and_validates() {
        let config: EngineConfig = serde_json::from_value(base()).unwrap();
        assert_eq!(config.fetch, FetchTuning::default());

        let vocab = config.vocabulary().unwrap();
        assert_eq!(vocab.palette.len(), 2);
        assert_eq!(vocab.palette[0].name, "primary");
        assert_eq!(vocab.palette[0].token_name(), "color-primary");
        assert_eq!(vocab.viewport.width, 1440.0);
    }

    #[test]
    fn test_camel_case_aliases() {
        let config: EngineConfig = serde_json::from_value(json!({
            "colorThreshold": 5.0,
            "spacingSteps": [4],
            "fontSteps": [12],
            "maxFetchRetries": 0,
            "fetchTimeoutMs": 10,
            "palette": {},
            "viewportWidth": 375,
            "layout": { "overlapEpsilon": 0.0, "rowOverlapThreshold": 0.5, "alignEpsilon": 0.0 }
        }))
        .unwrap();
        assert_eq!(config.spacing_steps, vec![4.0]);
    }

    #[test]
    fn test_threshold_is_required() {
        let mut raw = base();
        raw.as_object_mut().unwrap().remove("color_threshold");
        assert!(serde_json::from_value::<EngineConfig>(raw).is_err());
    }

    #[test]
    fn test_unordered_steps_rejected() {
        let mut config: EngineConfig = serde_json::from_value(base()).unwrap();
        config.spacing_steps = vec![4.0, 16.0, 8.0];
        assert!(matches!(
            config.vocabulary(),
            Err(ConfigError::UnorderedSteps { field: "spacing_steps", .. })
        ));

        config.spacing_steps = vec![];
        assert!(matches!(config.vocabulary(), Err(ConfigError::EmptySteps { .. })));
    }

    #[test]
    fn test_zero_fetch_timeout_rejected() {
        let mut config: EngineConfig = serde_json::from_value(base()).unwrap();
        config.fetch_timeout_ms = 0;
        assert!(matches!(
            config.vocabulary(),
            Err(ConfigError::OutOfRange { field: "fetch_timeout_ms", .. })
        ));

        config.fetch_timeout_ms = 1;
        assert!(config.vocabulary().is_ok());
    }

    #[test]
    fn test_bad_palette_rejected() {
        let mut config: EngineConfig = serde_json::from_value(base()).unwrap();
        config.palette.insert("Brand Blue".to_string(), "#0000ff".to_string());
        assert!(matches!(config.vocabulary(), Err(ConfigError::InvalidTokenName { .. })));

        let mut config: EngineConfig = serde_json::from_value(base()).unwrap();
        config.palette.insert("brand".to_string(), "blue".to_string());
        assert!(matches!(config.vocabulary(), Err(ConfigError::InvalidPaletteColor { .. })));
    }

    #[test]
    fn test_token_names() {
        assert_eq!(TokenVocabulary::spacing_token(16.0), "space-16");
        assert_eq!(TokenVocabulary::spacing_token(2.5), "space-2_5");
        assert_eq!(TokenVocabulary::font_token(14.0), "font-14");
    }
}
