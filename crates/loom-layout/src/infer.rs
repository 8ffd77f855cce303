//! Layout inference.
//!
//! Each group of siblings is analysed once: overlays are split off first,
//! then the remaining flow children decide the parent's axis, gap, padding
//! and their own cross-axis alignment.

use crate::spec::{Alignment, Axis, LayoutMap, LayoutSpec, Offset, Padding, Positioning, Size, Spacing};
use glam::DVec2;
use loom_core::{
    nearest_step, Bounds, DesignDocument, DesignNode, LayoutError, LayoutTolerances, NodeId,
    TokenVocabulary, Viewport, Visit,
};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// Inputs shared by every inference call of a run.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub spacing_steps: &'a [f64],
    pub viewport: Viewport,
    pub tolerances: LayoutTolerances,
}

impl<'a> LayoutContext<'a> {
    pub fn new(vocab: &'a TokenVocabulary, tolerances: LayoutTolerances) -> Self {
        Self {
            spacing_steps: &vocab.spacing_steps,
            viewport: vocab.viewport,
            tolerances,
        }
    }

    /// Snap a measured distance to the spacing scale.
    pub fn snap(&self, raw: f64) -> Spacing {
        if !raw.is_finite() || raw <= 0.0 {
            return Spacing::Zero;
        }
        match nearest_step(self.spacing_steps, raw) {
            Some(nearest) if *nearest.value > 0.0 => Spacing::Step {
                token: TokenVocabulary::spacing_token(*nearest.value),
                step: *nearest.value,
            },
            _ => Spacing::Zero,
        }
    }
}

/// Infer the layout of one node.
///
/// `siblings` are the children of `parent` (the node included); the root is
/// passed with no parent.
pub fn infer(
    node: &DesignNode,
    siblings: &[DesignNode],
    parent: Option<&DesignNode>,
    ctx: &LayoutContext<'_>,
) -> Result<LayoutSpec, LayoutError> {
    let own = analyze(&node.bounds, &node.children, ctx);

    let slot = match parent {
        None => None,
        Some(parent) => {
            let index = siblings.iter().position(|s| s.id == node.id).ok_or_else(|| {
                LayoutError::NotASibling { node: node.id.clone(), parent: parent.id.clone() }
            })?;
            Some((analyze(&parent.bounds, siblings, ctx), index))
        }
    };

    let slot = slot.as_ref().zip(parent).map(|((group, index), parent)| Slot {
        group,
        index: *index,
        siblings,
        parent: &parent.bounds,
    });

    build_spec(node, &own, slot, ctx)
}

/// Infer the layout of every node in a document.
pub fn infer_tree(doc: &DesignDocument, ctx: &LayoutContext<'_>) -> Result<LayoutMap, LayoutError> {
    let visits: Vec<Visit<'_>> = doc.depth_first().collect();

    let groups: Vec<Group> = visits
        .par_iter()
        .map(|visit| analyze(&visit.node.bounds, &visit.node.children, ctx))
        .collect();

    let mut group_of: HashMap<&NodeId, usize> = HashMap::with_capacity(visits.len());
    let mut map = LayoutMap::default();

    for (position, visit) in visits.iter().enumerate() {
        group_of.insert(&visit.node.id, position);

        let slot = match visit.parent {
            None => None,
            Some(parent) => {
                let group = group_of
                    .get(&parent.id)
                    .map(|&p| &groups[p])
                    .ok_or_else(|| LayoutError::MissingSpec { node: parent.id.clone() })?;
                Some(Slot {
                    group,
                    index: visit.index,
                    siblings: &parent.children,
                    parent: &parent.bounds,
                })
            }
        };

        let spec = build_spec(visit.node, &groups[position], slot, ctx)?;
        map.insert(visit.node.id.clone(), spec);
    }

    debug!(nodes = map.len(), overlays = map.overlays().count(), "inferred layout");
    Ok(map)
}

/// Layout decisions for one group of siblings.
#[derive(Debug, Clone, Default)]
struct Group {
    axis: Axis,
    gap: Spacing,
    padding: Padding,
    placements: Vec<Placement>,
}

#[derive(Debug, Clone, Default)]
struct Placement {
    alignment: Alignment,
    spacing_before: Option<Spacing>,
    /// Index of the flow sibling this node is anchored to.
    anchor: Option<usize>,
}

/// A node's place within its parent's group.
struct Slot<'a> {
    group: &'a Group,
    index: usize,
    siblings: &'a [DesignNode],
    parent: &'a Bounds,
}

fn build_spec(
    node: &DesignNode,
    own: &Group,
    slot: Option<Slot<'_>>,
    ctx: &LayoutContext<'_>,
) -> Result<LayoutSpec, LayoutError> {
    let (alignment, spacing_before, positioning) = match slot {
        None => (Alignment::Stretch, None, Positioning::Flow),
        Some(slot) => {
            let placement = slot
                .group
                .placements
                .get(slot.index)
                .ok_or_else(|| LayoutError::MissingSpec { node: node.id.clone() })?;

            let positioning = match placement.anchor {
                None => Positioning::Flow,
                Some(anchor) => {
                    let anchored_to_flow = slot
                        .group
                        .placements
                        .get(anchor)
                        .is_some_and(|p| p.anchor.is_none());
                    let anchor_node = slot.siblings.get(anchor).filter(|_| anchored_to_flow).ok_or_else(
                        || LayoutError::MissingAnchor { node: node.id.clone() },
                    )?;

                    let anchor_origin = origin(&anchor_node.bounds);
                    Positioning::Overlay {
                        anchor: anchor_node.id.clone(),
                        offset: Offset::from_design(origin(&node.bounds) - anchor_origin, &ctx.viewport),
                        origin: Offset::from_design(anchor_origin - origin(slot.parent), &ctx.viewport),
                    }
                }
            };

            (placement.alignment, placement.spacing_before.clone(), positioning)
        }
    };

    Ok(LayoutSpec {
        axis: own.axis,
        alignment,
        gap: own.gap.clone(),
        spacing_before,
        padding: own.padding.clone(),
        positioning,
        size: Size {
            width: ctx.viewport.to_responsive(node.bounds.width),
            height: ctx.viewport.to_responsive(node.bounds.height),
        },
    })
}

fn origin(bounds: &Bounds) -> DVec2 {
    DVec2::new(bounds.x, bounds.y)
}

fn analyze(parent: &Bounds, children: &[DesignNode], ctx: &LayoutContext<'_>) -> Group {
    let tolerances = &ctx.tolerances;
    let anchors = find_anchors(children, tolerances.overlap_epsilon);

    let mut placements: Vec<Placement> = anchors
        .iter()
        .map(|&anchor| Placement {
            alignment: if anchor.is_some() { Alignment::Start } else { Alignment::Stretch },
            spacing_before: None,
            anchor,
        })
        .collect();

    let flow: SmallVec<[usize; 8]> = (0..children.len()).filter(|&i| anchors[i].is_none()).collect();
    let Some(content) = flow
        .iter()
        .map(|&i| children[i].bounds)
        .reduce(|acc, bounds| acc.union(&bounds))
    else {
        return Group { placements, ..Group::default() };
    };

    let axis = if flow.len() > 1 && shares_row(children, &flow, tolerances.row_overlap_threshold) {
        Axis::Row
    } else {
        Axis::Column
    };

    let gaps: SmallVec<[Spacing; 8]> = flow
        .windows(2)
        .map(|pair| {
            let (prev, next) = (&children[pair[0]].bounds, &children[pair[1]].bounds);
            let raw = match axis {
                Axis::Row => next.x - prev.right(),
                Axis::Column => next.y - prev.bottom(),
            };
            ctx.snap(raw)
        })
        .collect();

    let uniform = gaps.iter().all(|gap| Some(gap) == gaps.first());
    let gap = if uniform {
        gaps.first().cloned().unwrap_or_default()
    } else {
        for (k, spacing) in gaps.into_iter().enumerate() {
            placements[flow[k + 1]].spacing_before = Some(spacing);
        }
        Spacing::Zero
    };

    if flow.len() > 1 {
        let tolerance = tolerances.align_epsilon;
        for &i in &flow {
            placements[i].alignment = align(&children[i].bounds, parent, axis, tolerance);
        }
    }

    let padding = Padding {
        top: ctx.snap(content.y - parent.y),
        right: ctx.snap(parent.right() - content.right()),
        bottom: ctx.snap(parent.bottom() - content.bottom()),
        left: ctx.snap(content.x - parent.x),
    };

    Group { axis, gap, padding, placements }
}

/// For each child, the flow sibling it is anchored to, if it is an overlay.
///
/// A child overlapping an earlier sibling by more than `epsilon` of the
/// smaller box is anchored to the highest-indexed such sibling, or to that
/// sibling's own anchor when it is itself an overlay.
fn find_anchors(children: &[DesignNode], epsilon: f64) -> Vec<Option<usize>> {
    let mut anchors: Vec<Option<usize>> = Vec::with_capacity(children.len());

    for (i, child) in children.iter().enumerate() {
        let anchor = (0..i)
            .rev()
            .find(|&j| overlaps(&child.bounds, &children[j].bounds, epsilon))
            .map(|j| anchors[j].unwrap_or(j));
        anchors.push(anchor);
    }

    anchors
}

fn overlaps(a: &Bounds, b: &Bounds, epsilon: f64) -> bool {
    a.intersection_area(b) > epsilon * a.area().min(b.area())
}

fn shares_row(children: &[DesignNode], flow: &[usize], threshold: f64) -> bool {
    flow.iter().enumerate().all(|(k, &a)| {
        flow[k + 1..].iter().all(|&b| {
            let (a, b) = (&children[a].bounds, &children[b].bounds);
            a.vertical_overlap(b) > threshold * a.height.min(b.height)
        })
    })
}

/// Cross-axis alignment of a flow child within its parent.
///
/// Only a child spanning the parent's cross extent stretches; any other
/// child keeps its own size and is placed by its margins to the parent.
fn align(child: &Bounds, parent: &Bounds, axis: Axis, epsilon: f64) -> Alignment {
    let (lead, size, parent_lead, extent) = match axis {
        Axis::Row => (child.y, child.height, parent.y, parent.height),
        Axis::Column => (child.x, child.width, parent.x, parent.width),
    };
    let tolerance = epsilon * extent;

    if (extent - size).abs() <= tolerance {
        return Alignment::Stretch;
    }

    let leading = lead - parent_lead;
    let trailing = (parent_lead + extent) - (lead + size);
    if (leading - trailing).abs() <= tolerance {
        Alignment::Center
    } else if leading <= trailing {
        Alignment::Start
    } else {
        Alignment::End
    }
}
