//! Core types and shared primitives for the Loom design-to-code engine.
//!
//! This crate provides the foundations every other loom crate builds on:
//! - The design document model (`DesignNode`, `DesignDocument`) and its parser
//! - A single depth-first traversal used by every pass
//! - Colors with perceptual (LAB) distance
//! - Responsive units and the token vocabulary configuration
//! - The nearest-in-ordered-set primitive
//! - Error types

pub mod ast;
pub mod color;
pub mod config;
pub mod errors;
pub mod nearest;
pub mod parse;
pub mod raw;
pub mod traverse;
pub mod units;

pub use ast::*;
pub use color::{Color, LabColor};
pub use config::{
    EngineConfig, FetchTuning, LayoutTolerances, PaletteEntry, TokenKind, TokenVocabulary,
};
pub use errors::*;
pub use nearest::{nearest_by, nearest_step, Nearest, TieBreak};
pub use parse::{parse, parse_str};
pub use traverse::{DepthFirst, Visit};
pub use units::{ResponsiveLength, Viewport};
