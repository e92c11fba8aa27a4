//! Parameter references that do not resolve to a declaration.

use ciyaml_core::{
    params::{self, ParamReference, ParamScope},
    range::{Range, index_to_pos},
};
use ciyaml_parser::{
    cst::{is_scalar_kind, walk_preorder},
    error::{Diagnostic, ErrorCode},
};

use super::Validator;

impl Validator<'_> {
    pub(super) fn validate_parameter_usage(&mut self) {
        let document = self.document;
        let source = document.source();

        let references: Vec<(ParamReference, Range)> = document.with_cst(|cst, root| {
            let mut found = Vec::new();
            walk_preorder(root, |node| {
                if !is_scalar_kind(node.kind()) {
                    return;
                }
                for reference in params::find_param_references(cst.raw_text(node)) {
                    let start = index_to_pos(node.start_byte() + reference.start, source);
                    let end = index_to_pos(node.start_byte() + reference.end, source);
                    found.push((reference, Range::new(start, end)));
                }
            });
            found
        });

        for (reference, range) in references {
            let is_defined = match reference.scope {
                ParamScope::Pipeline => self.pipeline_parameters().contains_key(&reference.name),
                ParamScope::Local => document
                    .params_at(range.start)
                    .is_some_and(|defined| defined.contains_key(&reference.name)),
            };
            if is_defined {
                continue;
            }

            let message = match reference.scope {
                ParamScope::Pipeline => format!("Pipeline parameter {} is not defined", reference.name),
                ParamScope::Local => format!("Parameter {} is not defined", reference.name),
            };
            self.emit(
                Diagnostic::error(message)
                    .with_code(ErrorCode::E203)
                    .with_range(range),
            );
        }
    }
}
