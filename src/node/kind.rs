use crate::geometry::Color;

/// Closed set of node kinds. Behavior that varies per kind lives in the
/// lookup methods below rather than in separate node types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Feature,
    Background,
    Scenario,
    Step,
    Comment,
    /// Invisible structural node: the canvas and the two scroll containers.
    Root,
}

impl NodeKind {
    pub const ALL_BARS: [NodeKind; 5] = [
        NodeKind::Feature,
        NodeKind::Scenario,
        NodeKind::Background,
        NodeKind::Comment,
        NodeKind::Step,
    ];

    /// Whether a node of kind `child` may be attached under this kind.
    pub fn accepts(self, child: NodeKind) -> bool {
        match self {
            NodeKind::Feature => matches!(child, NodeKind::Scenario | NodeKind::Background),
            NodeKind::Background | NodeKind::Scenario => {
                matches!(child, NodeKind::Step | NodeKind::Comment)
            }
            NodeKind::Step | NodeKind::Comment => false,
            NodeKind::Root => child != NodeKind::Root,
        }
    }

    pub fn is_foldable(self) -> bool {
        matches!(
            self,
            NodeKind::Feature | NodeKind::Background | NodeKind::Scenario
        )
    }

    /// Kinds that end a text block with a blank line and separate groups
    /// in the document.
    pub fn is_group(self) -> bool {
        self.is_foldable()
    }

    /// Horizontal offset applied to the children of this kind.
    pub fn child_indent(self) -> f32 {
        match self {
            NodeKind::Root => 0.0,
            _ => 50.0,
        }
    }

    /// Gap left below the node before its next sibling.
    pub fn vertical_padding(self) -> f32 {
        match self {
            NodeKind::Feature | NodeKind::Background | NodeKind::Scenario => 10.0,
            NodeKind::Step | NodeKind::Comment => 5.0,
            NodeKind::Root => 0.0,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            NodeKind::Feature => "Feature",
            NodeKind::Background => "Background",
            NodeKind::Scenario => "Scenario",
            NodeKind::Step => "Step",
            NodeKind::Comment => "Comment",
            NodeKind::Root => "",
        }
    }

    /// Title used for freshly created template nodes.
    pub fn template_title(self) -> &'static str {
        match self {
            NodeKind::Feature => "Feature",
            NodeKind::Background => "Background",
            NodeKind::Scenario => "Scenario",
            NodeKind::Step => "New step",
            NodeKind::Comment => "Comment",
            NodeKind::Root => "",
        }
    }

    /// Bar color as `[normal, highlighted]`.
    pub fn bar_colors(self) -> [Color; 2] {
        match self {
            NodeKind::Feature => [Color::from_hex(0xAAAAFF), Color::from_hex(0xBBBBEE)],
            NodeKind::Background => [Color::from_hex(0x888888), Color::from_hex(0xAAAAAA)],
            NodeKind::Scenario => [Color::from_hex(0x88CC88), Color::from_hex(0x99DD99)],
            NodeKind::Step => [Color::from_hex(0xEE6666), Color::from_hex(0xDD9999)],
            NodeKind::Comment => [Color::rgb(0.6, 0.6, 0.6), Color::rgb(0.7, 0.7, 0.7)],
            NodeKind::Root => [Color::TRANSPARENT, Color::TRANSPARENT],
        }
    }
}
