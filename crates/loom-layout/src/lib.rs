//! Layout inference for Loom.
//!
//! Design tools hand over absolutely positioned boxes. This crate recovers a
//! flex layout from that geometry:
//!
//! 1. **Overlays**: siblings that overlap an earlier sibling are taken out of
//!    the flow and anchored to a flow-positioned sibling
//! 2. **Axis**: the remaining flow siblings form a row or a column
//! 3. **Spacing**: gaps and padding are snapped to the spacing scale
//! 4. **Alignment**: cross-axis placement within the content box
//!
//! All lengths are expressed in responsive units; raw coordinates never leave
//! this crate.

mod infer;
mod spec;

pub use infer::{infer, infer_tree, LayoutContext};
pub use spec::{Alignment, Axis, LayoutMap, LayoutSpec, Offset, Padding, Positioning, Size, Spacing};
