//! Responsive units.
//!
//! Absolute design coordinates are never emitted. Every length is converted to
//! a fraction of the reference viewport width (`vw`), which keeps aspect
//! ratios intact when the generated layout is shown on other device sizes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference viewport the design was drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
}

impl Viewport {
    pub fn new(width: f64) -> Self {
        Self { width }
    }

    /// Convert a design-space length to viewport-relative units.
    pub fn to_responsive(&self, design_units: f64) -> ResponsiveLength {
        ResponsiveLength::vw(design_units / self.width * 100.0)
    }
}

/// A length expressed in `vw`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponsiveLength {
    vw: f64,
}

impl ResponsiveLength {
    pub const ZERO: Self = Self { vw: 0.0 };

    pub fn vw(vw: f64) -> Self {
        Self { vw }
    }

    pub fn value(&self) -> f64 {
        self.vw
    }

    /// Value rounded to the precision used in generated output.
    fn rounded(&self) -> f64 {
        let rounded = (self.vw * 10_000.0).round() / 10_000.0;
        if rounded == 0.0 {
            0.0
        } else {
            rounded
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rounded() == 0.0
    }
}

impl fmt::Display for ResponsiveLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        if rounded == 0.0 {
            return f.write_str("0");
        }
        let text = format!("{rounded:.4}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        write!(f, "{text}vw")
    }
}
