//! The `orbs:` section.
//!
//! `name: namespace/orb@version` declares a registry orb. A mapping value
//! declares a local orb, whose body is parsed as a document of its own.

use log::debug;
use tree_sitter::Node;

use ciyaml_core::{
    range::{Position, Range},
    semantic::{OrbReference, OrbUrl},
};

use crate::{
    cst::{Pair, node_range},
    document::{Document, DocumentKind, LocalOrb},
    parser::DocumentParser,
};

impl<'t> DocumentParser<'t> {
    pub(crate) fn parse_orbs(&mut self, node: Node<'t>) {
        for pair in self.pairs(node) {
            let Some(orb) = self.parse_orb(&pair) else {
                continue;
            };
            self.orbs.insert(orb.name.clone(), orb);
        }
    }

    fn parse_orb(&mut self, pair: &Pair<'t>) -> Option<OrbReference> {
        let key = pair.key?;
        let value = pair.raw_value?;
        let name = self.cst.text(key);

        let mut orb = OrbReference {
            name: name.clone(),
            name_range: node_range(key),
            range: pair.range(),
            value_range: node_range(value),
            ..OrbReference::default()
        };

        match value.kind() {
            "flow_node" => {
                orb.url = OrbUrl::parse(&self.cst.text(value));
                orb.version_range = self.version_range(value);
            }
            "block_node" if self.cst.mapping_of(value).is_some() => {
                let local = self.parse_local_orb(&name, value);
                orb.url = OrbUrl {
                    name: name.clone(),
                    version: String::new(),
                    is_local: true,
                };
                self.local_orbs.insert(name, local);
            }
            _ => return None,
        }
        Some(orb)
    }

    /// The range of the text after `@`, empty when there is no `@`.
    fn version_range(&self, value: Node<'t>) -> Range {
        let raw = self.cst.raw_text(value);
        let Some(at) = raw.find('@') else {
            return Range::default();
        };
        let range = node_range(value);
        Range::new(
            Position::new(range.start.line, range.start.character + at as u32 + 1),
            range.end,
        )
    }

    /// Parse a local orb body as an orb document.
    ///
    /// Every byte before the body is blanked out, keeping line breaks, so the
    /// sub-document's ranges are already those of the enclosing document.
    fn parse_local_orb(&mut self, name: &str, body: Node<'t>) -> LocalOrb {
        let source = self.cst.source();
        let prefix = source.get(..body.start_byte()).unwrap_or_default();
        let text = source.get(body.byte_range()).unwrap_or_default();

        let mut padded: String = prefix
            .bytes()
            .map(|b| match b {
                b'\n' | b'\r' => char::from(b),
                _ => ' ',
            })
            .collect();
        padded.push_str(text);
        padded.push('\n');

        debug!(orb = name; "Parsing local orb");
        let document = Document::parse_as(padded, DocumentKind::Orb).ok();
        if let Some(document) = &document {
            self.diagnostics.extend(document.diagnostics().iter().cloned());
        }

        LocalOrb {
            name: name.to_string(),
            range: node_range(body),
            document: document.map(Box::new),
        }
    }
}
