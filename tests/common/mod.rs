#![allow(dead_code)]

use specboard::node::Node;
use specboard::prelude::*;

pub fn scene() -> SceneGraph {
    let mut scene =
        SceneGraph::new(SceneConfig::default()).with_measurer(MonospaceMeasurer::default());
    scene.set_window_size(1400.0, 800.0);
    scene
}

/// Tick until every panel, bar and fade has come to rest.
pub fn settle(scene: &mut SceneGraph) {
    let mut now = scene.now_ms();
    for _ in 0..150 {
        now += 20;
        scene.update(now);
        scene.render();
    }
}

pub fn tick(scene: &mut SceneGraph, ms: u64) {
    let now = scene.now_ms() + ms;
    scene.update(now);
    scene.render();
}

pub fn center(scene: &SceneGraph, id: NodeId) -> (f32, f32) {
    let rect = scene.node(id).map(Node::render_rect).unwrap_or_default();
    (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
}

/// Every node below the canvas root appears exactly once in its parent.
pub fn assert_single_ownership(scene: &SceneGraph) {
    let tree = scene.canvas().tree();
    for id in tree.descendants(scene.canvas().root()).into_iter().skip(1) {
        let parent = tree.parent(id).expect("every node has a parent");
        let count = tree.children(parent).iter().filter(|c| **c == id).count();
        assert_eq!(count, 1, "{id:?} appears {count} times under {parent:?}");
    }
}
