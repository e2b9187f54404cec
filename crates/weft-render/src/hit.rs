//! Hit testing: point → node lookup.
//!
//! Reverse-walks the render tree (front-to-back) to find which labeled
//! container is under a canvas position. Instance descendants report their
//! logical (unqualified) id.

use crate::tree::{ContainerId, RenderTree};
use kurbo::{Affine, Point, Rect, Shape};
use weft_core::id::NodeId;

/// Find the topmost node at `point` (canvas coordinates).
/// Returns `None` if no node is hit (background).
pub fn hit_test(tree: &RenderTree, point: Point) -> Option<NodeId> {
    hit_container(tree, tree.root(), Affine::IDENTITY, point)
}

fn hit_container(tree: &RenderTree, id: ContainerId, parent: Affine, point: Point) -> Option<NodeId> {
    let container = tree.get(id)?;
    if !container.visible {
        return None;
    }
    let transform = parent * container.transform.to_affine();
    let local = transform.inverse() * point;

    let inside_mask = container
        .mask
        .as_ref()
        .is_none_or(|mask| mask.to_path().contains(local));
    if inside_mask {
        // Children in reverse (topmost first)
        for &child in container.children().iter().rev() {
            if let Some(hit) = hit_container(tree, child, transform, point) {
                return Some(hit);
            }
        }
    }

    if container.role.is_none()
        && !container.display.is_empty()
        && container.local_bounds().contains(local)
    {
        return container.label;
    }
    None
}

/// Labels of every visible labeled container whose world bounds intersect
/// `rect`, in paint order. Used for marquee selection.
pub fn hit_test_rect(tree: &RenderTree, rect: Rect) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_rect(tree, tree.root(), Affine::IDENTITY, rect, &mut out);
    out
}

fn collect_rect(tree: &RenderTree, id: ContainerId, parent: Affine, rect: Rect, out: &mut Vec<NodeId>) {
    let Some(container) = tree.get(id) else {
        return;
    };
    if !container.visible {
        return;
    }
    let transform = parent * container.transform.to_affine();
    if container.role.is_none()
        && let Some(label) = container.label
        && transform
            .transform_rect_bbox(container.local_bounds())
            .overlaps(rect)
    {
        out.push(label);
    }
    for &child in container.children() {
        collect_rect(tree, child, transform, rect, out);
    }
}
