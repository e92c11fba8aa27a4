use ciyaml_core::range::Range;
use ciyaml_parser::error::{Diagnostic, ErrorCode};

use super::Validator;

/// A named definition of one section.
struct Definition<'d> {
    kind: &'static str,
    name: &'d str,
    range: Range,
}

impl Validator<'_> {
    /// Warn when a workflow, a job and a command share a name.
    pub(super) fn validate_names(&mut self) {
        let document = self.document;
        let workflows = document.workflows().values().map(|workflow| Definition {
            kind: "workflow",
            name: &workflow.name,
            range: workflow.name_range,
        });
        let jobs = document.jobs().values().map(|job| Definition {
            kind: "job",
            name: &job.name,
            range: job.name_range,
        });
        let commands = document.commands().values().map(|command| Definition {
            kind: "command",
            name: &command.name,
            range: command.name_range,
        });
        let definitions: Vec<Definition<'_>> = workflows.chain(jobs).chain(commands).collect();

        for (index, first) in definitions.iter().enumerate() {
            for second in &definitions[index + 1..] {
                if first.kind == second.kind || first.name != second.name {
                    continue;
                }
                self.emit(name_collision(first, second.kind));
                self.emit(name_collision(second, first.kind));
            }
        }
    }
}

fn name_collision(definition: &Definition<'_>, other_kind: &str) -> Diagnostic {
    Diagnostic::warning(format!(
        "The name \"{}\" is already used to define a {other_kind}. You might want to use a different name to avoid confusion.",
        definition.name
    ))
    .with_code(ErrorCode::E308)
    .with_range(definition.range)
}

#[cfg(test)]
mod tests {
    use crate::validate::test_support::{matching, validate};

    #[test]
    fn test_shared_names() {
        let source = "\
version: 2.1
commands:
  build:
    steps: [checkout]
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  build:
    jobs: [build]
";
        let diagnostics = validate(source);

        assert_eq!(matching(&diagnostics, "already used to define a workflow").len(), 2);
        assert_eq!(matching(&diagnostics, "already used to define a job").len(), 2);
        assert_eq!(matching(&diagnostics, "already used to define a command").len(), 2);
    }

    #[test]
    fn test_distinct_names() {
        let source = "\
version: 2.1
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  main:
    jobs: [build]
";

        assert!(matching(&validate(source), "already used").is_empty());
    }
}
