//! Fold and visibility cascades.
//!
//! Folding only animates the alpha of descendants; the `FOLDED` flag of the
//! descendants themselves is left alone so an unfold restores the previous
//! shape of the subtree.

use super::{collect_tags, is_parent_folded, Node, NodeFlags, NodeKind};
use crate::animation::FadeSpeeds;
use crate::tree::{NodeId, Tree};

fn speed_or_immediate(animate: bool, speed: f32) -> f32 {
    if animate {
        speed
    } else {
        0.0
    }
}

/// Fade every child to `alpha`, continuing into children that are not
/// folded themselves. Hidden children drop to zero at once.
pub fn fold_fade(tree: &mut Tree<Node>, id: NodeId, alpha: f32, speed: f32) {
    let children = tree.children(id).to_vec();
    for child in children {
        let Some(node) = tree.get_mut(child) else {
            continue;
        };
        if !node.is_visible() {
            node.animator.color.set_alpha(0.0, 0.0);
            continue;
        }
        node.animator.color.set_alpha(alpha, speed);
        if !node.is_folded() {
            fold_fade(tree, child, alpha, speed);
        }
    }
}

/// Click behavior: flip the fold state of a foldable node that has children.
/// Returns whether anything changed.
pub fn toggle_fold(tree: &mut Tree<Node>, id: NodeId, fades: &FadeSpeeds) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !node.kind.is_foldable() || !node.is_visible() {
        return false;
    }
    if tree.children(id).is_empty() || is_parent_folded(tree, id) {
        return false;
    }
    let folded = !node.is_folded();
    if let Some(node) = tree.get_mut(id) {
        node.flags.set(NodeFlags::FOLDED, folded);
    }
    let alpha = if folded { 0.0 } else { fades.bar_alpha };
    fold_fade(tree, id, alpha, fades.fold);
    true
}

fn set_folded(tree: &mut Tree<Node>, id: NodeId, folded: bool, animate: bool, fades: &FadeSpeeds) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    if !node.kind.is_foldable() || !node.is_visible() {
        return;
    }
    node.flags.set(NodeFlags::FOLDED, folded);
    let alpha = if folded { 0.0 } else { fades.bar_alpha };
    fold_fade(tree, id, alpha, speed_or_immediate(animate, fades.fold));
}

pub fn fold(tree: &mut Tree<Node>, id: NodeId, animate: bool, fades: &FadeSpeeds) {
    set_folded(tree, id, true, animate, fades);
}

pub fn unfold(tree: &mut Tree<Node>, id: NodeId, animate: bool, fades: &FadeSpeeds) {
    set_folded(tree, id, false, animate, fades);
}

pub fn fold_all(tree: &mut Tree<Node>, id: NodeId, fades: &FadeSpeeds) {
    for node in tree.descendants(id) {
        fold(tree, node, true, fades);
    }
}

pub fn unfold_all(tree: &mut Tree<Node>, id: NodeId, fades: &FadeSpeeds) {
    for node in tree.descendants(id) {
        unfold(tree, node, true, fades);
    }
}

pub fn show(tree: &mut Tree<Node>, id: NodeId, animate: bool, fades: &FadeSpeeds) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    if !animate {
        node.flags.insert(NodeFlags::STICK_TO_PARENT);
    }
    if node.is_visible() {
        return;
    }
    node.flags.insert(NodeFlags::VISIBLE);
    node.animator
        .color
        .set_alpha(fades.bar_alpha, speed_or_immediate(animate, fades.appear));
}

pub fn hide(tree: &mut Tree<Node>, id: NodeId, animate: bool, fades: &FadeSpeeds) {
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    if !animate {
        node.flags.insert(NodeFlags::STICK_TO_PARENT);
    }
    if !node.is_visible() {
        return;
    }
    node.flags.remove(NodeFlags::VISIBLE);
    node.animator
        .color
        .set_alpha(0.0, speed_or_immediate(animate, fades.appear));
}

/// What a tag filter is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagFilter {
    /// Keep features carrying one of the tags.
    Features,
    /// Keep scenarios carrying one of the tags, and the features around them.
    Scenarios,
    /// Keep matching features whole, plus matching scenarios elsewhere.
    FeaturesAndScenarios,
}

fn contains_any_tag(tree: &Tree<Node>, id: NodeId, tags: &[String]) -> bool {
    let own = collect_tags(tree, id, &[]);
    tags.iter()
        .map(|t| t.trim().trim_start_matches('@'))
        .any(|t| own.iter().any(|o| o == t))
}

fn set_shown(tree: &mut Tree<Node>, id: NodeId, shown: bool, fades: &FadeSpeeds) {
    if shown {
        show(tree, id, false, fades);
    } else {
        hide(tree, id, false, fades);
    }
}

fn stick_subtree(tree: &mut Tree<Node>, id: NodeId) {
    super::stick_children(tree, id, true);
}

/// Show or hide the features under `document` (and their direct children)
/// according to `tags`.
pub fn filter_by_tags(
    tree: &mut Tree<Node>,
    document: NodeId,
    tags: &[String],
    mode: TagFilter,
    fades: &FadeSpeeds,
) {
    let features = tree.children(document).to_vec();
    for feature in features {
        let feature_matches = contains_any_tag(tree, feature, tags);
        let children = tree.children(feature).to_vec();
        let keep_whole_feature = match mode {
            TagFilter::Features => true,
            TagFilter::Scenarios => false,
            TagFilter::FeaturesAndScenarios => feature_matches,
        };
        if keep_whole_feature {
            set_shown(tree, feature, feature_matches, fades);
            for child in children {
                set_shown(tree, child, feature_matches, fades);
                stick_subtree(tree, child);
            }
            continue;
        }
        let mut any_child = false;
        for child in children {
            let is_scenario = tree.get(child).map(|n| n.kind) == Some(NodeKind::Scenario);
            let matches = is_scenario && contains_any_tag(tree, child, tags);
            any_child |= matches;
            set_shown(tree, child, matches, fades);
            stick_subtree(tree, child);
        }
        set_shown(tree, feature, any_child, fades);
    }
}

/// Undo any tag filter under `document`.
pub fn remove_filter(tree: &mut Tree<Node>, document: NodeId, fades: &FadeSpeeds) {
    let features = tree.children(document).to_vec();
    for feature in features {
        let children = tree.children(feature).to_vec();
        for child in children {
            show(tree, child, false, fades);
            stick_subtree(tree, child);
        }
        show(tree, feature, false, fades);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Role;

    fn node(kind: NodeKind) -> Node {
        Node::new(kind, Role::Document, format!("{kind:?}"))
    }

    fn sample() -> (Tree<Node>, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let doc = tree.insert(node(NodeKind::Root));
        let feature = tree.insert(node(NodeKind::Feature));
        let scenario = tree.insert(node(NodeKind::Scenario));
        let step = tree.insert(node(NodeKind::Step));
        tree.append_child(doc, feature);
        tree.append_child(feature, scenario);
        tree.append_child(scenario, step);
        (tree, doc, feature, scenario, step)
    }

    fn settle(tree: &mut Tree<Node>, ids: &[NodeId]) {
        for _ in 0..200 {
            for &id in ids {
                if let Some(n) = tree.get_mut(id) {
                    n.animator.update(false);
                }
            }
        }
    }

    #[test]
    fn test_toggle_fold_cascades_alpha_only() {
        let fades = FadeSpeeds::default();
        let (mut tree, _doc, feature, scenario, step) = sample();
        assert!(toggle_fold(&mut tree, feature, &fades));
        settle(&mut tree, &[scenario, step]);

        assert!(tree.get(feature).map(Node::is_folded).unwrap_or(false));
        assert!(!tree.get(scenario).map(Node::is_folded).unwrap_or(true));
        assert_eq!(tree.get(step).map(|n| n.animator.color.alpha()), Some(0.0));

        assert!(toggle_fold(&mut tree, feature, &fades));
        settle(&mut tree, &[scenario, step]);
        assert_eq!(
            tree.get(step).map(|n| n.animator.color.alpha()),
            Some(fades.bar_alpha)
        );
    }

    #[test]
    fn test_unfold_does_not_reveal_folded_grandchildren() {
        let fades = FadeSpeeds::default();
        let (mut tree, _doc, feature, scenario, step) = sample();
        toggle_fold(&mut tree, scenario, &fades);
        toggle_fold(&mut tree, feature, &fades);
        toggle_fold(&mut tree, feature, &fades);
        settle(&mut tree, &[scenario, step]);
        assert_eq!(tree.get(step).map(|n| n.animator.color.alpha()), Some(0.0));
        assert!(tree.get(scenario).map(|n| n.animator.color.is_visible()).unwrap_or(false));
    }

    #[test]
    fn test_leaf_and_childless_nodes_do_not_fold() {
        let fades = FadeSpeeds::default();
        let (mut tree, _doc, _feature, _scenario, step) = sample();
        assert!(!toggle_fold(&mut tree, step, &fades));
        let lonely = tree.insert(node(NodeKind::Scenario));
        assert!(!toggle_fold(&mut tree, lonely, &fades));
    }

    #[test]
    fn test_folded_node_can_still_hide_and_show() {
        let fades = FadeSpeeds::default();
        let (mut tree, _doc, feature, _scenario, _step) = sample();
        toggle_fold(&mut tree, feature, &fades);
        hide(&mut tree, feature, false, &fades);
        assert!(!tree.get(feature).map(Node::is_visible).unwrap_or(true));
        assert!(tree.get(feature).map(Node::is_folded).unwrap_or(false));
        show(&mut tree, feature, false, &fades);
        assert!(tree.get(feature).map(Node::is_visible).unwrap_or(false));
        assert!(tree.get(feature).map(Node::is_folded).unwrap_or(false));
    }

    #[test]
    fn test_filter_by_scenario_tags() {
        let fades = FadeSpeeds::default();
        let (mut tree, doc, feature, scenario, _step) = sample();
        let mut other = node(NodeKind::Scenario);
        other.add_tag("smoke");
        let other = tree.insert(other);
        tree.append_child(feature, other);

        filter_by_tags(&mut tree, doc, &["@smoke".into()], TagFilter::Scenarios, &fades);
        assert!(!tree.get(scenario).map(Node::is_visible).unwrap_or(true));
        assert!(tree.get(other).map(Node::is_visible).unwrap_or(false));
        assert!(tree.get(feature).map(Node::is_visible).unwrap_or(false));

        filter_by_tags(&mut tree, doc, &["@nothing".into()], TagFilter::Features, &fades);
        assert!(!tree.get(feature).map(Node::is_visible).unwrap_or(true));

        remove_filter(&mut tree, doc, &fades);
        for id in [feature, scenario, other] {
            assert!(tree.get(id).map(Node::is_visible).unwrap_or(false));
        }
    }
}
