//! Colors, color literal parsing and perceptual distance.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// LAB color space for perceptual color comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create from floating point channels in `0.0..=1.0`.
    pub fn from_unit(r: f64, g: f64, b: f64, a: f64) -> Option<Self> {
        Some(Self {
            r: unit_channel(r)?,
            g: unit_channel(g)?,
            b: unit_channel(b)?,
            a: unit_channel(a)?,
        })
    }

    /// Parse a color literal: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb(r, g, b)` or `rgba(r, g, b, a)` with alpha in `0..=1`.
    pub fn parse(input: &str) -> Option<Self> {
        all_consuming(delimited(multispace0, color_literal, multispace0))(input)
            .ok()
            .and_then(|(_, color)| color)
    }

    /// Convert to hexadecimal string (e.g., "#ff5500" or "#ff550080" with alpha).
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Convert to LAB color space (D65 white point).
    pub fn to_lab(&self) -> LabColor {
        let (x, y, z) = self.to_xyz();

        let ref_x = 95.047;
        let ref_y = 100.0;
        let ref_z = 108.883;

        let fx = lab_f(x / ref_x);
        let fy = lab_f(y / ref_y);
        let fz = lab_f(z / ref_z);

        LabColor {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    fn to_xyz(&self) -> (f64, f64, f64) {
        let r = srgb_to_linear(f64::from(self.r) / 255.0);
        let g = srgb_to_linear(f64::from(self.g) / 255.0);
        let b = srgb_to_linear(f64::from(self.b) / 255.0);

        let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
        let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
        let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

        (x * 100.0, y * 100.0, z * 100.0)
    }

    /// Perceptual distance: Delta E (CIE76) plus `|Δalpha| × 100`.
    pub fn distance(&self, other: &Color) -> f64 {
        let alpha = (f64::from(self.a) - f64::from(other.a)).abs() / 255.0 * 100.0;
        self.to_lab().distance(&other.to_lab()) + alpha
    }
}

impl LabColor {
    /// Calculate Delta E distance (CIE76).
    pub fn distance(&self, other: &LabColor) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        (dl * dl + da * da + db * db).sqrt()
    }
}

fn unit_channel(value: f64) -> Option<u8> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return None;
    }
    Some((value * 255.0).round() as u8)
}

fn byte_channel(value: f64) -> Option<u8> {
    if !value.is_finite() || !(0.0..=255.0).contains(&value) {
        return None;
    }
    Some(value.round() as u8)
}

fn lab_f(t: f64) -> f64 {
    let delta: f64 = 6.0 / 29.0;
    if t > delta.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * delta * delta) + 4.0 / 29.0
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn color_literal(input: &str) -> IResult<&str, Option<Color>> {
    alt((hex_color, functional_color))(input)
}

fn hex_color(input: &str) -> IResult<&str, Option<Color>> {
    map(
        preceded(char('#'), take_while1(|c: char| c.is_ascii_hexdigit())),
        from_hex_digits,
    )(input)
}

fn from_hex_digits(digits: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match digits.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn functional_color(input: &str) -> IResult<&str, Option<Color>> {
    let separator = tuple((multispace0, char(','), multispace0));
    map(
        tuple((
            tag_no_case("rgb"),
            opt(tag_no_case("a")),
            multispace0,
            delimited(
                tuple((char('('), multispace0)),
                separated_list1(separator, double),
                tuple((multispace0, char(')'))),
            ),
        )),
        |(_, alpha_form, _, channels)| from_channels(alpha_form.is_some(), &channels),
    )(input)
}

fn from_channels(alpha_form: bool, channels: &[f64]) -> Option<Color> {
    match (alpha_form, channels) {
        (false, [r, g, b]) => Some(Color::rgb(byte_channel(*r)?, byte_channel(*g)?, byte_channel(*b)?)),
        (true, [r, g, b, a]) => Some(Color::rgba(
            byte_channel(*r)?,
            byte_channel(*g)?,
            byte_channel(*b)?,
            unit_channel(*a)?,
        )),
        _ => None,
    }
}
