//! YAML anchors (`&name`) and aliases (`*name`).
//!
//! The anchor table is built in one pass over the whole tree before any
//! entity is parsed, since alias resolution during entity parsing reads it.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;
use tree_sitter::{Node, Tree};

use ciyaml_core::range::Range;

use crate::cst::{first_child_of_kind, node_range, walk_preorder};

/// A stable reference to a node of a document's syntax tree.
///
/// Nodes borrow the tree they belong to, so entities that outlive a parse
/// pass keep a handle and look the node up again when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    start_byte: usize,
    end_byte: usize,
    kind: &'static str,
}

impl NodeHandle {
    /// Capture a handle to `node`.
    pub fn new(node: Node<'_>) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            kind: node.kind(),
        }
    }

    /// Find the node this handle was taken from in `tree`.
    pub fn resolve<'t>(&self, tree: &'t Tree) -> Option<Node<'t>> {
        let mut node = tree
            .root_node()
            .descendant_for_byte_range(self.start_byte, self.end_byte)?;
        loop {
            if node.kind() == self.kind
                && node.start_byte() == self.start_byte
                && node.end_byte() == self.end_byte
            {
                return Some(node);
            }
            if node.start_byte() < self.start_byte || node.end_byte() > self.end_byte {
                return None;
            }
            node = node.parent()?;
        }
    }
}

/// An anchor definition and every alias that refers to it.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlAnchor {
    pub name: String,
    /// The range of `&name`.
    pub definition_range: Range,
    /// The ranges of the `*name` aliases, in document order.
    pub references: Vec<Range>,
    /// The node the anchor labels.
    pub value: NodeHandle,
    pub value_range: Range,
}

impl YamlAnchor {
    /// Returns `true` if no alias refers to this anchor.
    pub fn is_unused(&self) -> bool {
        self.references.is_empty()
    }
}

/// Anchors of one tree, with the live nodes they label.
#[derive(Debug, Default)]
pub(crate) struct AnchorTable<'t> {
    pub anchors: IndexMap<String, YamlAnchor>,
    pub value_nodes: HashMap<String, Node<'t>>,
    /// Aliases naming no anchor: the name and the alias range.
    pub unknown_aliases: Vec<(String, Range)>,
}

/// Collect every anchor and alias below `root`.
///
/// When a name is anchored twice the later definition wins, as in YAML.
pub(crate) fn scan<'t>(root: Node<'t>, source: &'t str) -> AnchorTable<'t> {
    let text = |node: Node<'t>| source.get(node.byte_range()).unwrap_or_default();
    let mut table = AnchorTable::default();
    let mut aliases = Vec::new();

    walk_preorder(root, |node| match node.kind() {
        "anchor" => {
            let Some(value) = node.parent() else {
                return;
            };
            let name = first_child_of_kind(node, "anchor_name")
                .map_or_else(|| text(node).trim_start_matches('&'), text)
                .to_string();
            if name.is_empty() {
                return;
            }

            table.value_nodes.insert(name.clone(), value);
            table.anchors.insert(
                name.clone(),
                YamlAnchor {
                    name,
                    definition_range: node_range(node),
                    references: Vec::new(),
                    value: NodeHandle::new(value),
                    value_range: node_range(value),
                },
            );
        }
        "alias" => aliases.push(node),
        _ => {}
    });

    for alias in aliases {
        let name = first_child_of_kind(alias, "alias_name")
            .map_or_else(|| text(alias).trim_start_matches('*'), text)
            .to_string();
        match table.anchors.get_mut(&name) {
            Some(anchor) => anchor.references.push(node_range(alias)),
            None => table.unknown_aliases.push((name, node_range(alias))),
        }
    }

    trace!(anchors = table.anchors.len(); "Scanned anchors");
    table
}
