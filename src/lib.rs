pub mod animation;
pub mod config;
pub mod container;
pub mod document;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod jobs;
pub mod node;
pub mod render;
pub mod runner;
pub mod scene;
pub mod scrollbar;
pub mod text;
pub mod tree;
pub mod undo;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::config::{DragConfig, LayoutConfig, SceneConfig};
    pub use crate::document::{DocumentCodec, DocumentNode, GherkinCodec};
    pub use crate::engine::{lock_scene, Engine, Presenter, SceneHandle, StopHandle};
    pub use crate::geometry::{Color, Point, Rect, Size};
    pub use crate::input::{InputEvent, Key, Modifiers, MouseButton};
    pub use crate::jobs::{JobQueue, SceneJob};
    pub use crate::node::{NodeKind, PlayState, Role, TagFilter};
    pub use crate::render::DrawCommand;
    pub use crate::scene::{SceneGraph, StatusMessage};
    pub use crate::scrollbar::{ScrollbarBuilder, ScrollbarConfig};
    pub use crate::text::{CosmicTextMeasurer, MonospaceMeasurer, TextMeasurer};
    pub use crate::tree::NodeId;
    pub use crate::{Error, Result};
}
