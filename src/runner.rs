//! Run status reported by an external test runner.
//!
//! The runner only knows names. [`RunTracker`] keeps a cursor of the
//! feature, scenario and step currently running and resolves each reported
//! name against the level below the cursor first, so repeated step texts
//! resolve to the next occurrence rather than the first.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::node::{set_failed, set_play_state_recursive, Node, NodeKind, PlayState};
use crate::tree::{NodeId, Tree};

/// A reported name matches a node whose title ends with it, so the runner
/// may leave out the step keyword.
fn title_matches(node: &Node, name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && node.title().trim().ends_with(name)
}

#[derive(Debug, Default)]
pub struct RunTracker {
    /// Subtree handed to the runner.
    scope: Option<NodeId>,
    feature: Option<NodeId>,
    group: Option<NodeId>,
    step: Option<NodeId>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.scope.is_some()
    }

    /// Begin a run over `scope`, clearing previous results there.
    pub fn start(&mut self, tree: &mut Tree<Node>, scope: NodeId) {
        set_play_state_recursive(tree, scope, PlayState::None);
        *self = Self {
            scope: Some(scope),
            ..Self::default()
        };
        log::info!("Run started at {scope:?}");
    }

    pub fn finish(&mut self) {
        if let Some(scope) = self.scope.take() {
            log::info!("Run finished at {scope:?}");
        }
        self.feature = None;
        self.group = None;
        self.step = None;
    }

    /// Nodes currently running, outermost first.
    pub fn current(&self) -> Vec<NodeId> {
        [self.feature, self.group, self.step]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn is_current_node(&self, id: NodeId) -> bool {
        self.feature == Some(id) || self.group == Some(id) || self.step == Some(id)
    }

    fn find_child_after(
        tree: &Tree<Node>,
        parent: NodeId,
        after: Option<NodeId>,
        name: &str,
    ) -> Option<NodeId> {
        let start = after
            .filter(|a| tree.parent(*a) == Some(parent))
            .and_then(|a| tree.index_of(a))
            .map_or(0, |i| i + 1);
        tree.children(parent)
            .iter()
            .skip(start)
            .copied()
            .find(|c| tree.get(*c).is_some_and(|n| title_matches(n, name)))
    }

    fn background_of(tree: &Tree<Node>, feature: NodeId) -> Option<NodeId> {
        tree.children(feature)
            .iter()
            .copied()
            .find(|c| tree.get(*c).is_some_and(|n| n.kind() == NodeKind::Background))
    }

    /// Next step of the current scenario or of its feature's background.
    /// The background goes first until one of the scenario's own steps ran.
    fn find_step(&self, tree: &Tree<Node>, name: &str) -> Option<NodeId> {
        let group = self.group?;
        let in_group = || Self::find_child_after(tree, group, self.step, name);
        let Some(background) = self
            .feature
            .and_then(|f| Self::background_of(tree, f))
            .filter(|b| *b != group)
        else {
            return in_group();
        };
        let in_background = || Self::find_child_after(tree, background, self.step, name);
        let setup_running = self
            .step
            .map_or(true, |s| tree.parent(s) == Some(background));
        if setup_running {
            in_background().or_else(in_group)
        } else {
            in_group().or_else(in_background)
        }
    }

    fn find_feature(&self, tree: &Tree<Node>, name: &str) -> Option<NodeId> {
        let scope = self.scope?;
        tree.descendants(scope).into_iter().find(|id| {
            tree.get(*id)
                .is_some_and(|n| n.kind() == NodeKind::Feature && title_matches(n, name))
        })
    }

    /// A node started. Steps are looked up after the current step (runners
    /// repeat background steps in every scenario), groups inside the
    /// current feature, features anywhere in the run scope.
    pub fn before_node(&mut self, tree: &mut Tree<Node>, name: &str) -> Result<NodeId> {
        let found = if let Some(step) = self.find_step(tree, name) {
            self.step = Some(step);
            step
        } else if let Some(group) = self
            .feature
            .and_then(|f| Self::find_child_after(tree, f, None, name))
        {
            self.group = Some(group);
            self.step = None;
            group
        } else if let Some(feature) = self.find_feature(tree, name) {
            self.feature = Some(feature);
            self.group = None;
            self.step = None;
            feature
        } else {
            log::warn!("Runner started unknown node {name:?}");
            return Err(Error::UnknownNode(name.to_string()));
        };
        if let Some(node) = tree.get_mut(found) {
            node.set_play_state(PlayState::Running);
        }
        Ok(found)
    }

    /// The innermost running node matching `name`.
    fn running_node(&self, tree: &Tree<Node>, name: &str) -> Result<NodeId> {
        [self.step, self.group, self.feature]
            .into_iter()
            .flatten()
            .find(|id| tree.get(*id).is_some_and(|n| title_matches(n, name)))
            .ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    fn leave(&mut self, id: NodeId) {
        if self.feature == Some(id) {
            self.feature = None;
            self.group = None;
            self.step = None;
        } else if self.group == Some(id) {
            self.group = None;
            self.step = None;
        }
    }

    pub fn after_node(&mut self, tree: &mut Tree<Node>, name: &str) -> Result<NodeId> {
        let id = self.running_node(tree, name)?;
        if let Some(node) = tree.get_mut(id) {
            if !node.is_failed() {
                node.set_play_state(PlayState::Success);
            }
        }
        self.leave(id);
        Ok(id)
    }

    /// Mark the node and its ancestors failed and keep the runner's message
    /// and screenshots on the node itself.
    pub fn after_node_failed(
        &mut self,
        tree: &mut Tree<Node>,
        name: &str,
        message: &str,
        screenshots: &[PathBuf],
    ) -> Result<NodeId> {
        let id = self.running_node(tree, name)?;
        set_failed(tree, id);
        if let Some(node) = tree.get_mut(id) {
            node.set_error_message(message);
            for shot in screenshots {
                node.add_screenshot(shot.clone());
            }
        }
        log::warn!("Runner reported failure in {name:?}: {message}");
        self.leave(id);
        Ok(id)
    }

    pub fn clear_run_status(tree: &mut Tree<Node>, id: NodeId) {
        set_play_state_recursive(tree, id, PlayState::None);
    }
}
