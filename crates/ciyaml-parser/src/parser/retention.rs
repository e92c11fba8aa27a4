use tree_sitter::Node;

use ciyaml_core::{range::TextAndRange, semantic::Retention};

use crate::{cst::node_range, parser::DocumentParser};

impl<'t> DocumentParser<'t> {
    /// Parse a job's `retention:` mapping.
    pub(crate) fn parse_retention(&self, node: Node<'t>) -> Retention {
        let mut retention = Retention {
            range: node_range(node),
            caches: None,
        };
        for pair in self.pairs(node) {
            let Some(value) = pair.value else {
                continue;
            };
            if self.cst.key_text(&pair) == "caches" {
                retention.caches = Some(TextAndRange::new(self.cst.text(value), pair.range()));
            }
        }
        retention
    }
}
