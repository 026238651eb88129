//! Plain-text form of the document.
//!
//! The scene only needs a codec that turns text into a tree of
//! [`DocumentNode`]s and back. [`GherkinCodec`] reads and writes the
//! indented keyword format:
//!
//! ```text
//! @web
//! Feature: Login
//!     Users sign in with a password.
//!
//!     Background:
//!         Given a registered user
//!
//!     @smoke
//!     Scenario: Correct password
//!         When the user signs in
//!         # happy path
//!         Then the dashboard opens
//!
//! ```

use crate::error::{Error, Result};
use crate::node::{Node, NodeKind};
use crate::tree::{NodeId, Tree};

const INDENT: &str = "    ";
const FOLD_STATE_PREFIX: &str = "# foldstate:";
/// Read as plain scenarios; their example tables stay as step lines.
const OUTLINE_KEYWORDS: [&str; 2] = ["Scenario Outline", "Scenario Template"];

/// Detached copy of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    pub kind: NodeKind,
    pub title: String,
    pub description: Vec<String>,
    pub tags: Vec<String>,
    pub folded: bool,
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: Vec::new(),
            tags: Vec::new(),
            folded: false,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.trim_start_matches('@').to_string());
        self
    }

    /// Snapshot of the subtree at `id`.
    pub fn from_tree(tree: &Tree<Node>, id: NodeId) -> Option<Self> {
        let node = tree.get(id)?;
        Some(Self {
            kind: node.kind(),
            title: node.title().to_string(),
            description: node.description().to_vec(),
            tags: node.tags().to_vec(),
            folded: node.is_folded(),
            children: tree
                .children(id)
                .iter()
                .filter_map(|c| Self::from_tree(tree, *c))
                .collect(),
        })
    }

    /// Number of nodes in the subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(DocumentNode::count).sum::<usize>()
    }
}

pub trait DocumentCodec: Send {
    /// Top-level features found in `text`.
    fn parse(&self, text: &str) -> Result<Vec<DocumentNode>>;

    fn serialize(&self, features: &[DocumentNode]) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GherkinCodec {
    /// Mark folded nodes with `# foldstate:` lines and honor them on parse.
    pub with_view_state: bool,
}

impl GherkinCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view_state(mut self, enabled: bool) -> Self {
        self.with_view_state = enabled;
        self
    }

    fn write_tags(out: &mut String, indent: &str, tags: &[String]) {
        if tags.is_empty() {
            return;
        }
        let line = tags
            .iter()
            .map(|t| format!("@{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(indent);
        out.push_str(&line);
        out.push('\n');
    }

    fn write_fold_state(&self, out: &mut String, indent: &str, node: &DocumentNode) {
        if self.with_view_state && node.folded {
            out.push_str(&format!("{indent}{FOLD_STATE_PREFIX} {}\n", node.folded));
        }
    }

    fn write_header(out: &mut String, indent: &str, node: &DocumentNode) {
        let keyword = node.kind.keyword();
        if node.title.is_empty() {
            out.push_str(&format!("{indent}{keyword}:\n"));
        } else {
            out.push_str(&format!("{indent}{keyword}: {}\n", node.title));
        }
    }

    fn write_group(&self, out: &mut String, group: &DocumentNode) {
        Self::write_tags(out, INDENT, &group.tags);
        self.write_fold_state(out, INDENT, group);
        Self::write_header(out, INDENT, group);
        let indent = INDENT.repeat(2);
        for child in &group.children {
            match child.kind {
                NodeKind::Comment => out.push_str(&format!("{indent}# {}\n", child.title)),
                _ => out.push_str(&format!("{indent}{}\n", child.title)),
            }
        }
        out.push('\n');
    }

    fn write_feature(&self, out: &mut String, feature: &DocumentNode) {
        Self::write_tags(out, "", &feature.tags);
        self.write_fold_state(out, "", feature);
        Self::write_header(out, "", feature);
        for line in &feature.description {
            out.push_str(INDENT);
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        for group in &feature.children {
            self.write_group(out, group);
        }
    }
}

fn keyword_title<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)?.strip_prefix(':').map(str::trim)
}

struct Parser {
    features: Vec<DocumentNode>,
    tags: Vec<String>,
    folded: Option<bool>,
    with_view_state: bool,
}

impl Parser {
    fn take_node(&mut self, kind: NodeKind, title: &str) -> DocumentNode {
        let mut node = DocumentNode::new(kind, title);
        node.tags = std::mem::take(&mut self.tags);
        node.folded = self.folded.take().unwrap_or(false) && self.with_view_state;
        node
    }

    fn current_feature(&mut self, line: usize, what: &str) -> Result<&mut DocumentNode> {
        self.features.last_mut().ok_or_else(|| Error::Parse {
            line,
            message: format!("{what} before any feature"),
        })
    }

    fn current_group(&mut self) -> Option<&mut DocumentNode> {
        self.features.last_mut()?.children.last_mut()
    }

    fn line(&mut self, number: usize, line: &str) -> Result<()> {
        if let Some(state) = line.strip_prefix(FOLD_STATE_PREFIX) {
            self.folded = Some(state.trim() == "true");
            return Ok(());
        }
        if line.starts_with('@') {
            self.tags.extend(
                line.split_whitespace()
                    .map(|t| t.trim_start_matches('@'))
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
            return Ok(());
        }
        if let Some(title) = keyword_title(line, "Feature") {
            let feature = self.take_node(NodeKind::Feature, title);
            self.features.push(feature);
            return Ok(());
        }
        if let Some(title) = OUTLINE_KEYWORDS
            .iter()
            .find_map(|keyword| keyword_title(line, keyword))
        {
            log::warn!("Line {number}: outline {title:?} imported as a plain scenario");
            let group = self.take_node(NodeKind::Scenario, title);
            self.current_feature(number, "Scenario")?.children.push(group);
            return Ok(());
        }
        for kind in [NodeKind::Background, NodeKind::Scenario] {
            if let Some(title) = keyword_title(line, kind.keyword()) {
                let group = self.take_node(kind, title);
                self.current_feature(number, kind.keyword())?
                    .children
                    .push(group);
                return Ok(());
            }
        }
        if let Some(comment) = line.strip_prefix('#') {
            // Comments only survive inside a scenario or background.
            self.tags.clear();
            if let Some(group) = self.current_group() {
                group
                    .children
                    .push(DocumentNode::new(NodeKind::Comment, comment.trim()));
            }
            return Ok(());
        }

        self.tags.clear();
        let feature = self.current_feature(number, "Step")?;
        if feature.children.is_empty() {
            feature.description.push(line.to_string());
            return Ok(());
        }
        if let Some(group) = self.current_group() {
            group.children.push(DocumentNode::new(NodeKind::Step, line));
        }
        Ok(())
    }
}

impl DocumentCodec for GherkinCodec {
    fn parse(&self, text: &str) -> Result<Vec<DocumentNode>> {
        let mut parser = Parser {
            features: Vec::new(),
            tags: Vec::new(),
            folded: None,
            with_view_state: self.with_view_state,
        };
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            parser.line(index + 1, line)?;
        }
        Ok(parser.features)
    }

    fn serialize(&self, features: &[DocumentNode]) -> String {
        let mut out = String::new();
        for feature in features {
            self.write_feature(&mut out, feature);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = "\
@web
Feature: Login
    Users sign in with a password.

    Background:
        Given a registered user

    @smoke @fast
    Scenario: Correct password
        When the user signs in
        # happy path
        Then the dashboard opens

";

    #[test]
    fn test_parse_structure() {
        let features = GherkinCodec::new().parse(LOGIN).unwrap();
        assert_eq!(features.len(), 1);
        let feature = &features[0];
        assert_eq!(feature.title, "Login");
        assert_eq!(feature.tags, vec!["web"]);
        assert_eq!(feature.description, vec!["Users sign in with a password."]);
        assert_eq!(feature.children[0].kind, NodeKind::Background);
        let scenario = &feature.children[1];
        assert_eq!(scenario.tags, vec!["smoke", "fast"]);
        let kinds: Vec<_> = scenario.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Step, NodeKind::Comment, NodeKind::Step]
        );
        assert_eq!(scenario.children[1].title, "happy path");
    }

    #[test]
    fn test_round_trip() {
        let codec = GherkinCodec::new();
        let features = codec.parse(LOGIN).unwrap();
        assert_eq!(codec.serialize(&features), LOGIN);
    }

    #[test]
    fn test_step_before_feature_is_an_error() {
        let err = GherkinCodec::new()
            .parse("\n\nGiven nothing\n")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_background_before_feature_is_an_error() {
        let err = GherkinCodec::new().parse("Background:\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_comment_outside_group_is_dropped() {
        let features = GherkinCodec::new()
            .parse("# top\nFeature: f\n# loose\n    Scenario: s\n        # kept\n")
            .unwrap();
        assert_eq!(features[0].description, Vec::<String>::new());
        assert_eq!(features[0].children[0].children.len(), 1);
    }

    #[test]
    fn test_view_state_round_trip() {
        let codec = GherkinCodec::new().with_view_state(true);
        let feature = DocumentNode::new(NodeKind::Feature, "f").with_child({
            let mut scenario = DocumentNode::new(NodeKind::Scenario, "s")
                .with_child(DocumentNode::new(NodeKind::Step, "Given x"));
            scenario.folded = true;
            scenario
        });
        let text = codec.serialize(std::slice::from_ref(&feature));
        assert!(text.contains("    # foldstate: true\n    Scenario: s\n"));
        assert_eq!(codec.parse(&text).unwrap(), vec![feature.clone()]);

        // Without view state the fold comments are ignored.
        let plain = GherkinCodec::new().parse(&text).unwrap();
        assert!(!plain[0].children[0].folded);
    }

    #[test]
    fn test_outline_reads_as_scenario() {
        let text = "\
Feature: Cucumbers
    Scenario Outline: Eating
        Given there are <start> cucumbers
        Examples:
        | start |
        | 12    |
    Scenario Template: Resting
        Given nothing happens
";
        let features = GherkinCodec::new().parse(text).unwrap();
        let groups = &features[0].children;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, NodeKind::Scenario);
        assert_eq!(groups[0].title, "Eating");
        assert_eq!(groups[1].title, "Resting");
        let lines: Vec<_> = groups[0].children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            lines,
            [
                "Given there are <start> cucumbers",
                "Examples:",
                "| start |",
                "| 12    |"
            ]
        );
        assert!(features[0].description.is_empty());
    }

    #[test]
    fn test_count() {
        let features = GherkinCodec::new().parse(LOGIN).unwrap();
        assert_eq!(features[0].count(), 7);
    }
}
