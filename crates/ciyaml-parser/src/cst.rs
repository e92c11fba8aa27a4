//! Navigation helpers over the tree-sitter YAML syntax tree.
//!
//! Every entity parser is written against [`Cst`], which hides the
//! difference between block and flow styles, follows aliases to the node
//! their anchor labels, and expands `<<` merge keys while iterating a mapping.
//!
//! Missing children are reported as `None`. Callers treat `None` as an absent
//! field: a document being edited is routinely incomplete.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use ciyaml_core::range::{Position, Range, TextAndRange};

/// Key of a YAML merge pair.
pub const MERGE_KEY: &str = "<<";

/// Alias chains longer than this are treated as unresolvable.
const MAX_ALIAS_DEPTH: usize = 32;

/// Convert a node's row/column span into a [`Range`].
pub fn node_range(node: Node<'_>) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(
        Position::new(start.row as u32, start.column as u32),
        Position::new(end.row as u32, end.column as u32),
    )
}

/// The 1-character range right after a list-item marker.
///
/// Used for items such as a bare `- ` that have no value node to point at.
pub fn item_marker_range(item: Node<'_>) -> Range {
    let start = item.start_position();
    Range::from_coords(
        start.row as u32,
        start.column as u32 + 1,
        start.row as u32,
        start.column as u32 + 2,
    )
}

/// Visit `root` and all of its descendants in document order.
pub fn walk_preorder<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// A `key: value` pair of a block or flow mapping.
#[derive(Debug, Clone, Copy)]
pub struct Pair<'t> {
    /// The `block_mapping_pair` or `flow_pair` node.
    pub node: Node<'t>,
    pub key: Option<Node<'t>>,
    /// The value as written, which may be an alias.
    pub raw_value: Option<Node<'t>>,
    /// The value with aliases followed to the anchored node.
    pub value: Option<Node<'t>>,
}

impl Pair<'_> {
    /// The range of the whole pair.
    pub fn range(&self) -> Range {
        node_range(self.node)
    }

    /// The range of the key, or of the pair if the key is missing.
    pub fn key_range(&self) -> Range {
        self.key.map_or_else(|| self.range(), node_range)
    }

    /// The range of the value as written.
    pub fn value_range(&self) -> Option<Range> {
        self.raw_value.map(node_range)
    }

    /// The range used for a key written without a value.
    ///
    /// Covers the pair and runs to the end of its line so that editors can
    /// place a completion after the colon.
    pub fn open_range(&self) -> Range {
        let range = self.range();
        if self.raw_value.is_some() {
            range
        } else {
            range.extend_to_line_end()
        }
    }
}

/// An item of a block or flow sequence.
#[derive(Debug, Clone, Copy)]
pub struct Item<'t> {
    /// The `block_sequence_item`, or the flow node itself in a flow sequence.
    pub node: Node<'t>,
    /// The item value as written, `None` for a bare `-`.
    pub raw_value: Option<Node<'t>>,
    /// The item value with aliases followed.
    pub value: Option<Node<'t>>,
}

impl Item<'_> {
    /// The range of the whole item.
    pub fn range(&self) -> Range {
        node_range(self.node)
    }
}

/// Read-only view of a syntax tree and its source text.
#[derive(Debug, Clone)]
pub struct Cst<'t> {
    source: &'t str,
    anchors: HashMap<String, Node<'t>>,
}

impl<'t> Cst<'t> {
    /// Create a view over `source`.
    ///
    /// `anchors` maps every anchor name to the node it labels. Aliases can
    /// only be followed once this table is complete.
    pub fn new(source: &'t str, anchors: HashMap<String, Node<'t>>) -> Self {
        Self { source, anchors }
    }

    /// The source text the tree was parsed from.
    pub fn source(&self) -> &'t str {
        self.source
    }

    /// The exact source text of a node.
    pub fn raw_text(&self, node: Node<'t>) -> &'t str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// The anchored node an alias name refers to.
    pub fn anchor_node(&self, name: &str) -> Option<Node<'t>> {
        self.anchors.get(name).copied()
    }

    /// The name of an `alias` node, without its `*` sigil.
    pub fn alias_name(&self, alias: Node<'t>) -> String {
        first_child_of_kind(alias, "alias_name").map_or_else(
            || self.raw_text(alias).trim_start_matches('*').to_string(),
            |name| self.raw_text(name).to_string(),
        )
    }

    /// The node carrying the content of a `block_node` or `flow_node`.
    ///
    /// Anchors, tags and comments are skipped and aliases are followed. Any
    /// other node is its own content.
    pub fn content(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.content_at_depth(node, 0)
    }

    fn content_at_depth(&self, node: Node<'t>, depth: usize) -> Option<Node<'t>> {
        if depth > MAX_ALIAS_DEPTH {
            return None;
        }

        match node.kind() {
            "block_node" | "flow_node" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .find(|child| !matches!(child.kind(), "anchor" | "tag" | "comment"))?;
                self.content_at_depth(inner, depth + 1)
            }
            "alias" => {
                let target = self.anchor_node(&self.alias_name(node))?;
                self.content_at_depth(target, depth + 1)
            }
            _ => Some(node),
        }
    }

    /// Follow a value node to the anchored node if it is an alias.
    pub fn resolve(&self, node: Node<'t>) -> Node<'t> {
        let mut current = node;
        for _ in 0..MAX_ALIAS_DEPTH {
            let Some(alias) = self.alias_of(current) else {
                return current;
            };
            match self.anchor_node(&self.alias_name(alias)) {
                Some(target) => current = target,
                None => return current,
            }
        }
        current
    }

    /// The alias node a value consists of, if any.
    pub fn alias_of(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "alias" => Some(node),
            "flow_node" | "block_node" => first_child_of_kind(node, "alias"),
            _ => None,
        }
    }

    /// Returns `true` if the value is written as an alias.
    pub fn is_alias(&self, node: Node<'t>) -> bool {
        self.alias_of(node).is_some()
    }

    /// The block or flow mapping held by `node`.
    pub fn mapping_of(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.content(node)
            .filter(|content| matches!(content.kind(), "block_mapping" | "flow_mapping"))
    }

    /// The block or flow sequence held by `node`.
    pub fn sequence_of(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.content(node)
            .filter(|content| matches!(content.kind(), "block_sequence" | "flow_sequence"))
    }

    /// The scalar node held by `node`.
    pub fn scalar_of(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.content(node).filter(|content| is_scalar_kind(content.kind()))
    }

    /// The text of a value, with quoting and block indicators removed.
    ///
    /// Non-scalar values yield their trimmed source text.
    pub fn text(&self, node: Node<'t>) -> String {
        let Some(content) = self.content(node) else {
            return String::new();
        };

        match content.kind() {
            "double_quote_scalar" => unescape_double_quoted(strip_quotes(self.raw_text(content), '"')),
            "single_quote_scalar" => strip_quotes(self.raw_text(content), '\'').replace("''", "'"),
            "block_scalar" => block_scalar_text(self.raw_text(content)),
            _ => self.raw_text(content).trim().to_string(),
        }
    }

    /// The text of an optional node, empty when absent.
    pub fn text_or_empty(&self, node: Option<Node<'t>>) -> String {
        node.map(|node| self.text(node)).unwrap_or_default()
    }

    /// Build a [`Pair`] from a `block_mapping_pair` or `flow_pair` node.
    pub fn pair(&self, node: Node<'t>) -> Option<Pair<'t>> {
        if !matches!(node.kind(), "block_mapping_pair" | "flow_pair") {
            return None;
        }
        let key = node.child_by_field_name("key");
        let raw_value = node.child_by_field_name("value");

        Some(Pair {
            node,
            key,
            raw_value,
            value: raw_value.map(|value| self.resolve(value)),
        })
    }

    /// The text of a pair's key.
    pub fn key_text(&self, pair: &Pair<'t>) -> String {
        self.text_or_empty(pair.key)
    }

    /// The direct pairs of the mapping held by `node`, merge keys included.
    pub fn direct_pairs(&self, node: Node<'t>) -> Vec<Pair<'t>> {
        let Some(mapping) = self.mapping_of(node) else {
            return Vec::new();
        };
        let mut cursor = mapping.walk();
        mapping
            .named_children(&mut cursor)
            .filter_map(|child| self.pair(child))
            .collect()
    }

    /// Visit the pairs of the mapping held by `node`, expanding merge keys.
    ///
    /// Direct pairs are visited first, in document order, and all of them
    /// are visited even when a key repeats. Then each merged mapping is
    /// visited in the order the merge key lists them, skipping keys already
    /// seen. Explicit keys therefore shadow merged ones, and earlier merge
    /// sources shadow later ones. A merged mapping that is already being
    /// expanded is skipped, so self-referencing merges terminate.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ciyaml_parser::Document;
    /// let source = "base: &base\n  a: 2\n  b: 3\nuse:\n  a: 1\n  <<: *base\n";
    /// let doc = Document::parse(source).expect("grammar loads");
    /// let mut seen = Vec::new();
    /// doc.with_cst(|cst, root| {
    ///     let mapping = cst.direct_pairs(root).into_iter().nth(1).and_then(|p| p.value);
    ///     if let Some(mapping) = mapping {
    ///         cst.for_each_pair(mapping, |pair| {
    ///             seen.push((cst.key_text(&pair), cst.text_or_empty(pair.value)));
    ///         });
    ///     }
    /// });
    /// assert_eq!(seen, vec![("a".into(), "1".into()), ("b".into(), "3".into())]);
    /// ```
    pub fn for_each_pair(&self, node: Node<'t>, mut f: impl FnMut(Pair<'t>)) {
        let mut seen = HashSet::new();
        let mut expanding = HashSet::new();
        self.visit_mapping(node, true, &mut seen, &mut expanding, &mut f);
    }

    fn visit_mapping(
        &self,
        node: Node<'t>,
        is_root: bool,
        seen: &mut HashSet<String>,
        expanding: &mut HashSet<usize>,
        f: &mut dyn FnMut(Pair<'t>),
    ) {
        let Some(mapping) = self.mapping_of(node) else {
            return;
        };
        if !expanding.insert(mapping.id()) {
            return;
        }

        let shadowed = seen.clone();
        let mut merge_sources = Vec::new();
        for pair in self.direct_pairs(mapping) {
            let key = self.key_text(&pair);
            if key == MERGE_KEY {
                if let Some(value) = pair.value {
                    merge_sources.extend(self.merge_sources(value));
                }
                continue;
            }
            if !is_root && shadowed.contains(&key) {
                continue;
            }
            seen.insert(key);
            f(pair);
        }

        for source in merge_sources {
            self.visit_mapping(source, false, seen, expanding, f);
        }
    }

    /// The mappings a merge key's value splices in, in precedence order.
    pub fn merge_sources(&self, value: Node<'t>) -> Vec<Node<'t>> {
        if let Some(mapping) = self.mapping_of(value) {
            return vec![mapping];
        }

        let mut sources = Vec::new();
        if self.sequence_of(value).is_some() {
            self.for_each_item(value, |item| {
                if let Some(mapping) = item.value.and_then(|value| self.mapping_of(value)) {
                    sources.push(mapping);
                }
            });
        }
        sources
    }

    /// Returns `true` if a merge key's value is a mapping, an alias to one,
    /// or a sequence of those.
    pub fn is_valid_merge_value(&self, value: Node<'t>) -> bool {
        if self.mapping_of(value).is_some() {
            return true;
        }
        if self.sequence_of(value).is_none() {
            return false;
        }

        let mut valid = true;
        self.for_each_item(value, |item| {
            if item.value.and_then(|value| self.mapping_of(value)).is_none() {
                valid = false;
            }
        });
        valid
    }

    /// Find the first pair with the given key, merge keys included.
    pub fn find_pair(&self, node: Node<'t>, key: &str) -> Option<Pair<'t>> {
        let mut found = None;
        self.for_each_pair(node, |pair| {
            if found.is_none() && self.key_text(&pair) == key {
                found = Some(pair);
            }
        });
        found
    }

    /// Visit the items of the sequence held by `node`.
    pub fn for_each_item(&self, node: Node<'t>, mut f: impl FnMut(Item<'t>)) {
        let Some(sequence) = self.sequence_of(node) else {
            return;
        };

        let mut cursor = sequence.walk();
        for child in sequence.named_children(&mut cursor) {
            match child.kind() {
                "block_sequence_item" => {
                    let mut item_cursor = child.walk();
                    let raw_value = child
                        .named_children(&mut item_cursor)
                        .find(|inner| matches!(inner.kind(), "block_node" | "flow_node"));
                    f(Item {
                        node: child,
                        raw_value,
                        value: raw_value.map(|value| self.resolve(value)),
                    });
                }
                "flow_node" | "flow_pair" => f(Item {
                    node: child,
                    raw_value: Some(child),
                    value: Some(self.resolve(child)),
                }),
                _ => {}
            }
        }
    }

    /// The texts of a sequence's items, with item ranges.
    ///
    /// A bare `-` yields an empty text at the marker position.
    pub fn text_list(&self, node: Node<'t>) -> Vec<TextAndRange> {
        let mut texts = Vec::new();
        self.for_each_item(node, |item| match item.value {
            Some(value) => texts.push(TextAndRange::new(self.text(value), item.range())),
            None => texts.push(TextAndRange::new("", item_marker_range(item.node))),
        });
        texts
    }

    /// The texts of a sequence, or the single text of a scalar.
    pub fn text_list_or_text(&self, node: Node<'t>) -> Vec<String> {
        if self.sequence_of(node).is_some() {
            return self
                .text_list(node)
                .into_iter()
                .map(|entry| entry.text)
                .collect();
        }
        vec![self.text(node)]
    }
}

/// Returns `true` for the scalar node kinds.
pub fn is_scalar_kind(kind: &str) -> bool {
    matches!(
        kind,
        "plain_scalar" | "double_quote_scalar" | "single_quote_scalar" | "block_scalar"
    )
}

/// The first direct child of the given kind.
pub fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|child| child.kind() == kind)
}

fn strip_quotes(text: &str, quote: char) -> &str {
    let text = text.trim();
    let text = text.strip_prefix(quote).unwrap_or(text);
    text.strip_suffix(quote).unwrap_or(text)
}

fn unescape_double_quoted(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Decode a `|` or `>` block scalar: drop the indicator line and the
/// common indentation.
fn block_scalar_text(raw: &str) -> String {
    let mut lines = raw.lines();
    let header = lines.next().unwrap_or_default().trim_start();
    let folded = header.starts_with('>');

    let body: Vec<&str> = lines.collect();
    let indent = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = body
        .iter()
        .map(|line| line.get(indent..).unwrap_or_default())
        .collect();

    let separator = if folded { " " } else { "\n" };
    dedented.join(separator).trim().to_string()
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use crate::Document;

    // ===================
    // Strategies
    // ===================

    /// Small mappings with keys drawn from a shared pool, so explicit and
    /// merged keys overlap often.
    fn mapping_strategy() -> impl Strategy<Value = BTreeMap<String, u32>> {
        prop::collection::btree_map("[a-e]", 0u32..100, 1..5)
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Explicit keys shadow merged ones; merged keys fill in the rest.
    fn check_merge_precedence(
        explicit: &BTreeMap<String, u32>,
        merged: &BTreeMap<String, u32>,
    ) -> Result<(), TestCaseError> {
        let mut source = String::from("base: &base\n");
        for (key, value) in merged {
            source.push_str(&format!("  {key}: {value}\n"));
        }
        source.push_str("use:\n");
        for (key, value) in explicit {
            source.push_str(&format!("  {key}: {value}\n"));
        }
        source.push_str("  <<: *base\n");

        let document = Document::parse(source.as_str()).expect("grammar loads");
        let effective = document.with_cst(|cst, root| {
            let mut effective = BTreeMap::new();
            if let Some(mapping) = cst.find_pair(root, "use").and_then(|pair| pair.value) {
                cst.for_each_pair(mapping, |pair| {
                    let value = cst.text_or_empty(pair.value).parse::<u32>().unwrap_or(u32::MAX);
                    effective.insert(cst.key_text(&pair), value);
                });
            }
            effective
        });

        let mut expected = merged.clone();
        expected.extend(explicit.iter().map(|(key, value)| (key.clone(), *value)));
        prop_assert_eq!(effective, expected);
        Ok(())
    }

    /// Parsing the same text twice gives the same model.
    fn check_parse_is_idempotent(names: &[String]) -> Result<(), TestCaseError> {
        let mut source = String::from("version: 2.1\njobs:\n");
        for name in names {
            source.push_str(&format!("  {name}:\n    steps: [checkout]\n"));
        }

        let first = Document::parse(source.as_str()).expect("grammar loads");
        let second = Document::parse(source.as_str()).expect("grammar loads");
        prop_assert_eq!(first.jobs(), second.jobs());
        prop_assert_eq!(first.diagnostics(), second.diagnostics());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn merge_precedence(explicit in mapping_strategy(), merged in mapping_strategy()) {
            check_merge_precedence(&explicit, &merged)?;
        }

        #[test]
        fn parse_is_idempotent(names in prop::collection::vec("[a-z][a-z0-9_]{0,8}", 0..6)) {
            check_parse_is_idempotent(&names)?;
        }
    }
}
