use super::{is_parent_folded, Node, NodeFlags};
use crate::animation::FadeSpeeds;
use crate::geometry::Point;
use crate::tree::{NodeId, Tree};

/// A node can be picked up when it is at rest, visible, outside any folded
/// ancestor and not locked by its kind.
pub fn is_draggable(tree: &Tree<Node>, id: NodeId) -> bool {
    match tree.get(id) {
        Some(node) => {
            !node.animator.movement.is_moving()
                && node.is_visible()
                && node.can_drag()
                && !is_parent_folded(tree, id)
        }
        None => false,
    }
}

fn drag_fade(tree: &mut Tree<Node>, id: NodeId, fades: &FadeSpeeds) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    node.set_highlighted(false);
    let alpha = if node.is_dragged() {
        fades.drag_alpha
    } else {
        fades.bar_alpha
    };
    node.animator.color.set_alpha(alpha, fades.drag);
    if node.is_folded() {
        return;
    }
    let children = tree.children(id).to_vec();
    for child in children {
        if let Some(c) = tree.get_mut(child) {
            c.animator.color.set_alpha(alpha, fades.fold);
        }
    }
}

/// Capture the pointer-to-node offset and dim the node.
pub fn start_drag(tree: &mut Tree<Node>, id: NodeId, pointer: Point, fades: &FadeSpeeds) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    let render = node.animator.movement.render();
    node.flags.insert(NodeFlags::DRAGGED);
    node.drag_offset = Point::new(render.x - pointer.x, render.y - pointer.y);
    drag_fade(tree, id, fades);
}

/// Pin the node under the pointer and make its subtree follow it.
pub fn apply_drag_offset(tree: &mut Tree<Node>, id: NodeId, pointer: Point) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    let offset = node.drag_offset;
    node.animator
        .movement
        .set_render(pointer.x + offset.x, pointer.y + offset.y);
    stick_children(tree, id, true);
}

pub fn end_drag(tree: &mut Tree<Node>, id: NodeId, fades: &FadeSpeeds) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    node.flags.remove(NodeFlags::DRAGGED);
    drag_fade(tree, id, fades);
}

pub fn stick_children(tree: &mut Tree<Node>, id: NodeId, stick: bool) {
    let children = tree.children(id).to_vec();
    for child in children {
        stick_to_parent(tree, child, stick);
    }
}

/// Set or clear the stick flag on a subtree. Dragged nodes and everything
/// below them are skipped: their position belongs to the pointer.
pub fn stick_to_parent(tree: &mut Tree<Node>, id: NodeId, stick: bool) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    if node.is_dragged() {
        return;
    }
    node.flags.set(NodeFlags::STICK_TO_PARENT, stick);
    stick_children(tree, id, stick);
}
