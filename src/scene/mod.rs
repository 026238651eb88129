//! The scene: node tree, panels, input handling and the per-tick cycle.
//!
//! [`SceneGraph`] is the single owner of all scene state. Hosts feed input
//! through the entry points, which only queue events; [`SceneGraph::update`]
//! applies them, resolves drags and advances animations, and
//! [`SceneGraph::render`] lays out and paints into a display list.

mod canvas;

pub use canvas::Canvas;

use std::path::{Path, PathBuf};

use crate::config::SceneConfig;
use crate::document::{DocumentCodec, DocumentNode, GherkinCodec};
use crate::drag::{DragController, DragMode};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::input::{InputEvent, InputQueue, Key, Modifiers, MouseButton};
use crate::jobs::{JobQueue, SceneJob};
use crate::node::{
    filter_by_tags, find_element, fold, fold_all, remove_filter, stick_children,
    stick_to_parent, toggle_fold, unfold_all, Node, NodeKind, Role, TagFilter,
};
use crate::render::{DrawCommand, PaintContext, RenderPass};
use crate::runner::RunTracker;
use crate::text::{CosmicTextMeasurer, TextMeasurer};
use crate::tree::NodeId;
use crate::undo::UndoStack;

/// Flashing message shown to the user until it expires.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    text: String,
    is_error: bool,
    expires_at_ms: u64,
}

impl StatusMessage {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

pub struct SceneGraph {
    canvas: Canvas,
    drag: DragController,
    input: InputQueue,
    jobs: JobQueue,
    run: RunTracker,
    undo: UndoStack,
    codec: Box<dyn DocumentCodec>,
    measurer: Box<dyn TextMeasurer>,
    ctx: PaintContext,
    config: SceneConfig,
    status: Option<StatusMessage>,
    now_ms: u64,
}

impl SceneGraph {
    /// Empty document and the default templates.
    pub fn new(config: SceneConfig) -> Self {
        let mut scene = Self {
            canvas: Canvas::new(&config),
            drag: DragController::new(config.drag.clone()),
            input: InputQueue::new(),
            jobs: JobQueue::new(),
            run: RunTracker::new(),
            undo: UndoStack::new(config.undo_depth),
            codec: Box::new(GherkinCodec::new().with_view_state(config.save_view_state)),
            measurer: Box::new(CosmicTextMeasurer),
            ctx: PaintContext::with_capacity(256),
            config,
            status: None,
            now_ms: 0,
        };
        scene.reset_templates(true);
        scene
    }

    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn with_codec(mut self, codec: impl DocumentCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.canvas.node(id)
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag.mode()
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.drag.highlighted()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Current status message, if it has not expired.
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref().filter(|s| !s.is_expired(self.now_ms))
    }

    fn flash(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            expires_at_ms: self.now_ms + self.config.status_timeout_ms,
        });
    }

    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.canvas.set_window_size(width, height);
    }

    // ---- document -------------------------------------------------------

    /// First document node with exactly this title.
    pub fn find_node(&self, title: &str) -> Option<NodeId> {
        let tree = self.canvas.tree();
        tree.descendants(self.canvas.document())
            .into_iter()
            .find(|id| tree.get(*id).is_some_and(|n| n.title() == title))
    }

    /// First template of a kind.
    pub fn template(&self, kind: NodeKind) -> Option<NodeId> {
        let tree = self.canvas.tree();
        tree.children(self.canvas.templates())
            .iter()
            .copied()
            .find(|id| tree.get(*id).is_some_and(|n| n.kind() == kind))
    }

    pub fn features(&self) -> Vec<DocumentNode> {
        let tree = self.canvas.tree();
        tree.children(self.canvas.document())
            .iter()
            .filter_map(|id| DocumentNode::from_tree(tree, *id))
            .collect()
    }

    pub fn export_text(&self) -> String {
        self.codec.serialize(&self.features())
    }

    /// Build `doc` under `parent`, restoring its fold state.
    fn build(&mut self, parent: NodeId, doc: &DocumentNode, role: Role) -> Option<NodeId> {
        let id = self.canvas.create_node(doc.kind, role, &doc.title);
        if let Some(node) = self.canvas.node_mut(id) {
            node.set_description(doc.description.clone());
            for tag in &doc.tags {
                node.add_tag(tag);
            }
        }
        if !self.canvas.add_child(parent, id, None) {
            self.canvas.tree.remove(id);
            return None;
        }
        for child in &doc.children {
            self.build(id, child, role);
        }
        if doc.folded {
            let fades = self.canvas.fades;
            fold(&mut self.canvas.tree, id, false, &fades);
        }
        Some(id)
    }

    fn replace_document(&mut self, features: &[DocumentNode]) -> usize {
        self.drag.cancel(&mut self.canvas);
        if self.run.is_running() {
            self.run.finish();
        }
        let document = self.canvas.document();
        self.canvas.clear_panel(document);
        let mut count = 0;
        for feature in features {
            if self.build(document, feature, Role::Document).is_some() {
                count += feature.count();
            }
        }
        count
    }

    fn snapshot(&mut self) {
        let text = self.export_text();
        if self.undo.push(text) {
            log::debug!("Undo snapshot {}", self.undo.len());
        }
    }

    /// Replace the document with parsed text. On failure the document is
    /// left as it was and the error is flashed.
    pub fn import(&mut self, text: &str) -> Result<usize> {
        let features = match self.codec.parse(text) {
            Ok(features) if features.is_empty() => {
                self.flash("Nothing to import", true);
                return Err(Error::EmptyDocument);
            }
            Ok(features) => features,
            Err(err) => {
                log::warn!("Import failed: {err}");
                self.flash(format!("Import failed: {err}"), true);
                return Err(err);
            }
        };
        let count = self.replace_document(&features);
        self.undo.clear();
        self.snapshot();
        log::info!("Imported {} feature(s), {count} node(s)", features.len());
        self.flash(format!("Imported {} feature(s)", features.len()), false);
        Ok(count)
    }

    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log::error!("Failed to read {}: {err}", path.display());
                self.flash(format!("Failed to read {}", path.display()), true);
                return Err(err.into());
            }
        };
        let count = self.import(&text)?;
        let filename = path.display().to_string();
        for feature in self.canvas.tree().children(self.canvas.document()).to_vec() {
            if let Some(node) = self.canvas.node_mut(feature) {
                node.set_filename(filename.clone());
            }
        }
        Ok(count)
    }

    pub fn save_text(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.canvas.tree().children(self.canvas.document()).is_empty() {
            self.flash("Nothing to save", true);
            return Err(Error::NothingToSave(PathBuf::from(path)));
        }
        if let Err(err) = std::fs::write(path, self.export_text()) {
            log::error!("Failed to save {}: {err}", path.display());
            self.flash(format!("Failed to save {}", path.display()), true);
            return Err(err.into());
        }
        log::info!("Saved document to {}", path.display());
        self.flash(format!("Saved {}", path.display()), false);
        Ok(())
    }

    /// Start over with an empty document, optionally seeded with one
    /// feature and scenario. New throws land in that scenario.
    pub fn scratch(&mut self, with_template: bool) {
        self.replace_document(&[]);
        if with_template {
            let seed = DocumentNode::new(NodeKind::Feature, "New Feature")
                .with_child(DocumentNode::new(NodeKind::Scenario, "New Scenario"));
            let document = self.canvas.document();
            if let Some(feature) = self.build(document, &seed, Role::Document) {
                if let Some(&scenario) = self.canvas.tree().children(feature).first() {
                    self.canvas.update_last_added(scenario);
                }
            }
        }
        self.undo.clear();
        self.snapshot();
    }

    /// Empty the template panel, optionally refilling it with one node
    /// per kind.
    pub fn reset_templates(&mut self, with_defaults: bool) {
        self.drag.cancel(&mut self.canvas);
        let templates = self.canvas.templates();
        self.canvas.clear_panel(templates);
        if with_defaults {
            for kind in NodeKind::ALL_BARS {
                self.add_template_node(&DocumentNode::new(kind, kind.template_title()));
            }
        }
    }

    pub fn add_template_node(&mut self, doc: &DocumentNode) -> Option<NodeId> {
        let templates = self.canvas.templates();
        self.build(templates, doc, Role::Template)
    }

    /// Detach and destroy a node; a template is replaced by a copy.
    pub fn remove_child(&mut self, id: NodeId) -> bool {
        let in_document = self.node(id).is_some_and(|n| n.role() == Role::Document);
        if self.drag.dragged_node() == Some(id) {
            self.drag.cancel(&mut self.canvas);
        }
        let removed = self.canvas.remove_child(id);
        if removed && in_document {
            self.snapshot();
        }
        removed
    }

    /// Delete a document node. Templates are never trashed.
    pub fn trash(&mut self, id: NodeId) -> bool {
        if self.drag.dragged_node() == Some(id) || self.drag.highlighted() == Some(id) {
            self.drag.cancel(&mut self.canvas);
        }
        let trashed = self.canvas.trash(id);
        if trashed {
            self.snapshot();
        }
        trashed
    }

    /// Restore the latest snapshot that differs from the document.
    pub fn undo(&mut self) -> bool {
        let current = self.export_text();
        let Some(previous) = self.undo.undo(&current) else {
            return false;
        };
        match self.codec.parse(&previous) {
            Ok(features) => {
                self.replace_document(&features);
                log::debug!("Undo restored {} feature(s)", features.len());
                true
            }
            Err(err) => {
                log::error!("Undo snapshot did not parse: {err}");
                false
            }
        }
    }

    /// Show only the features or scenarios carrying one of `tags`.
    pub fn filter_by_tags(&mut self, tags: &[String], mode: TagFilter) {
        let document = self.canvas.document();
        let fades = self.canvas.fades;
        filter_by_tags(&mut self.canvas.tree, document, tags, mode, &fades);
        if let Some(container) = self.canvas.container_mut(document) {
            container.scroll_to_top();
        }
    }

    pub fn clear_filter(&mut self) {
        let document = self.canvas.document();
        let fades = self.canvas.fades;
        remove_filter(&mut self.canvas.tree, document, &fades);
        if let Some(container) = self.canvas.container_mut(document) {
            container.scroll_to_top();
        }
    }

    pub fn fold_all(&mut self) {
        let fades = self.canvas.fades;
        for panel in [self.canvas.templates(), self.canvas.document()] {
            fold_all(&mut self.canvas.tree, panel, &fades);
        }
    }

    pub fn unfold_all(&mut self) {
        let fades = self.canvas.fades;
        for panel in [self.canvas.templates(), self.canvas.document()] {
            unfold_all(&mut self.canvas.tree, panel, &fades);
        }
    }

    // ---- runner ---------------------------------------------------------

    /// Begin a run over a document subtree.
    pub fn start_run(&mut self, scope: NodeId) -> bool {
        if !matches!(self.node(scope), Some(n) if n.role() == Role::Document) {
            return false;
        }
        self.run.start(&mut self.canvas.tree, scope);
        true
    }

    pub fn before_node(&mut self, name: &str) -> Result<NodeId> {
        self.run.before_node(&mut self.canvas.tree, name)
    }

    pub fn after_node(&mut self, name: &str) -> Result<NodeId> {
        self.run.after_node(&mut self.canvas.tree, name)
    }

    pub fn after_node_failed(
        &mut self,
        name: &str,
        message: &str,
        screenshots: &[PathBuf],
    ) -> Result<NodeId> {
        self.run
            .after_node_failed(&mut self.canvas.tree, name, message, screenshots)
    }

    pub fn finish_run(&mut self) {
        self.run.finish();
    }

    pub fn is_current_node(&self, id: NodeId) -> bool {
        self.run.is_current_node(id)
    }

    pub fn clear_run_status(&mut self, id: NodeId) {
        RunTracker::clear_run_status(&mut self.canvas.tree, id);
    }

    /// Queue work for the start of the next tick.
    pub fn post(&mut self, job: SceneJob) {
        self.jobs.push(job);
    }

    /// Apply work posted from another thread.
    pub fn apply_job(&mut self, job: SceneJob) {
        let outcome = match job {
            SceneJob::Import(text) => self.import(&text).map(|_| ()),
            SceneJob::BeforeNode(name) => self.before_node(&name).map(|_| ()),
            SceneJob::AfterNode(name) => self.after_node(&name).map(|_| ()),
            SceneJob::AfterNodeFailed {
                name,
                message,
                screenshots,
            } => self
                .after_node_failed(&name, &message, &screenshots)
                .map(|_| ()),
            SceneJob::RunFinished => {
                self.finish_run();
                Ok(())
            }
            SceneJob::Status(text) => {
                self.flash(text, false);
                Ok(())
            }
        };
        if let Err(err) = outcome {
            log::warn!("Job failed: {err}");
        }
    }

    // ---- input ----------------------------------------------------------

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.push_input(InputEvent::PointerMoved { x, y });
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.push_input(InputEvent::PointerDown {
            x,
            y,
            button: MouseButton::Left,
            modifiers,
        });
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.push_input(InputEvent::PointerUp {
            x,
            y,
            button: MouseButton::Left,
        });
    }

    pub fn click(&mut self, x: f32, y: f32, count: u32) {
        self.push_input(InputEvent::Click {
            x,
            y,
            button: MouseButton::Left,
            count,
        });
    }

    pub fn wheel(&mut self, x: f32, y: f32, units: f32) {
        self.push_input(InputEvent::Wheel { x, y, units });
    }

    pub fn key_pressed(&mut self, key: Key, modifiers: Modifiers) {
        self.push_input(InputEvent::KeyPressed { key, modifiers });
    }

    fn handle_event(&mut self, event: InputEvent) {
        let now = self.now_ms;
        match event {
            InputEvent::PointerMoved { x, y } => {
                self.drag.pointer_moved(&mut self.canvas, Point::new(x, y));
                for panel in [self.canvas.document(), self.canvas.templates()] {
                    if let Some(container) = self.canvas.container_mut(panel) {
                        let over = container.is_over_scrollbar(x, y);
                        container.scrollbar_mut().set_hovered(over);
                    }
                }
            }
            InputEvent::PointerDown {
                x,
                y,
                button: MouseButton::Left,
                modifiers,
            } => {
                self.drag
                    .pointer_down(&mut self.canvas, Point::new(x, y), modifiers, now);
            }
            InputEvent::PointerUp {
                x,
                y,
                button: MouseButton::Left,
            } => {
                let release = self.drag.pointer_up(&mut self.canvas, Point::new(x, y), now);
                if release.is_some_and(|r| r.thrown || r.placed) {
                    self.snapshot();
                }
            }
            InputEvent::Click {
                x,
                y,
                button: MouseButton::Left,
                count,
            } => self.click_at(x, y, count),
            InputEvent::Wheel { x, y, units } => self.scroll_at(x, y, units),
            InputEvent::KeyPressed { key, .. } => self.handle_key(key),
            InputEvent::PointerLeft => self.drag.clear_highlight(&mut self.canvas),
            _ => {}
        }
    }

    /// A single click folds or unfolds; a double click on a template
    /// throws a copy into the document.
    fn click_at(&mut self, x: f32, y: f32, count: u32) {
        let root = self.canvas.root();
        let Some(id) = find_element(self.canvas.tree(), root, x, y) else {
            return;
        };
        let role = self.node(id).map(Node::role);
        if count >= 2 && role == Some(Role::Template) {
            if self.canvas.throw_to_document(id) {
                self.snapshot();
            }
            return;
        }
        let fades = self.canvas.fades;
        if toggle_fold(&mut self.canvas.tree, id, &fades) && role == Some(Role::Document) {
            self.snapshot();
        }
    }

    fn scroll_at(&mut self, x: f32, _y: f32, units: f32) {
        let panel = if x < self.canvas.splitter() {
            self.canvas.document()
        } else {
            self.canvas.templates()
        };
        let step = self.config.drag.wheel_step;
        if let Some(container) = self.canvas.container_mut(panel) {
            container.scroll_by(units * step);
        }
    }

    fn handle_key(&mut self, key: Key) {
        match key {
            Key::Char('+') => self.unfold_all(),
            Key::Char('-') => self.fold_all(),
            Key::Delete => {
                if let Some(id) = self.drag.highlighted() {
                    self.trash(id);
                }
            }
            Key::Escape => self.drag.cancel(&mut self.canvas),
            Key::Char(_) => {}
        }
    }

    // ---- tick -----------------------------------------------------------

    /// Apply posted jobs and queued input, resolve the held node and
    /// advance animations.
    pub fn update(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        for job in self.jobs.drain() {
            self.apply_job(job);
        }
        let events: Vec<InputEvent> = self.input.drain().collect();
        for event in events {
            self.handle_event(event);
        }
        if self.drag.resolve(&mut self.canvas, now_ms) {
            log::debug!("Drop position changed");
        }
        self.drag.update_highlight(&mut self.canvas);
        self.animate();
        if self.status.as_ref().is_some_and(|s| s.is_expired(now_ms)) {
            self.status = None;
        }
    }

    fn animate(&mut self) {
        let root = self.canvas.root();
        for id in self.canvas.tree.descendants(root) {
            let Some(node) = self.canvas.tree.get_mut(id) else {
                continue;
            };
            let retain = node.is_dragged();
            node.animator.update(retain);
            // A sliding panel carries its content along.
            if node.container.is_some() && node.animator.movement.is_moving() {
                stick_children(&mut self.canvas.tree, id, true);
            }
        }
    }

    /// Lay out and paint the whole canvas.
    pub fn render(&mut self) -> &[DrawCommand] {
        self.ctx.clear();
        let widths = self.canvas.bar_widths();
        let running = self.run.current();
        let window = self.canvas.window_size();
        let bounds = Rect::new(0.0, 0.0, window.width, window.height);
        let root = self.canvas.root();
        RenderPass::new(
            &mut self.canvas.tree,
            &mut *self.measurer,
            &mut self.ctx,
            &self.config.layout,
            widths,
            bounds,
        )
        .running(&running)
        .run(root);
        stick_to_parent(&mut self.canvas.tree, root, false);
        self.ctx.commands()
    }

    /// Display list of the last render.
    pub fn commands(&self) -> &[DrawCommand] {
        self.ctx.commands()
    }
}
