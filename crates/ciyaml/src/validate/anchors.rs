use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::Validator;

impl Validator<'_> {
    /// Report anchors no alias refers to.
    pub(super) fn validate_anchors(&mut self) {
        if !self.config.validation().unused() {
            return;
        }

        let document = self.document;
        for anchor in document.anchors().values().filter(|anchor| anchor.is_unused()) {
            self.emit(
                Diagnostic::info("Anchor never used")
                    .with_code(ErrorCode::E300)
                    .with_range(anchor.definition_range)
                    .with_tag(DiagnosticTag::Unnecessary),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validate::test_support::{matching, validate};

    #[test]
    fn test_unused_anchor() {
        let source = "\
version: 2.1
defaults: &defaults
  docker:
    - image: cimg/base:2024.01
used: &used
  docker:
    - image: cimg/base:2024.01
jobs:
  build:
    <<: *used
    steps: [checkout]
workflows:
  main:
    jobs: [build]
";
        let diagnostics = validate(source);
        let unused = matching(&diagnostics, "Anchor never used");

        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].range().start.line, 1);
    }
}
