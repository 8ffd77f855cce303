//! Design token resolution for Loom.
//!
//! Binds literal style values of design nodes to the named tokens of a
//! closed vocabulary (palette colors and font steps). A value that cannot be
//! matched within tolerance is kept as-is and marked unresolved.

mod binding;
mod tokens;

pub use binding::{NodeBindings, Resolution, TokenBinding, TokenBindings, TokenRef, Value};
pub use tokens::{resolve, resolve_tree, TokenResolver};
