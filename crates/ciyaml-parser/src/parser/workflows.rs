//! The `workflows:` section.

use tree_sitter::Node;

use ciyaml_core::{
    range::TextAndRange,
    semantic::{JobRef, Requirement, Workflow},
};

use crate::{
    cst::{Item, Pair, item_marker_range, node_range},
    error::{CodeAction, Diagnostic, ErrorCode},
    parser::{DocumentParser, insert_first_wins},
};

/// First version in which `workflows.version` is ignored.
const WORKFLOW_VERSION_DEPRECATED_SINCE: f64 = 2.1;

impl<'t> DocumentParser<'t> {
    pub(crate) fn parse_workflows(&mut self, node: Node<'t>) {
        for pair in self.pairs(node) {
            if self.cst.key_text(&pair) == "version" {
                if self.version >= WORKFLOW_VERSION_DEPRECATED_SINCE {
                    self.diagnostics.emit(
                        Diagnostic::warning("Version key is deprecated since 2.1")
                            .with_code(ErrorCode::E104)
                            .with_range(pair.range())
                            .with_action(CodeAction::replace(
                                "Delete version key",
                                pair.range(),
                                "",
                            )),
                    );
                }
                continue;
            }

            let Some(workflow) = self.parse_workflow(&pair) else {
                continue;
            };
            let name = workflow.name.clone();
            insert_first_wins(
                &mut self.workflows,
                &mut self.diagnostics,
                name,
                workflow,
                |workflow| workflow.name_range,
                "Workflow already defined",
            );
        }
    }

    fn parse_workflow(&mut self, pair: &Pair<'t>) -> Option<Workflow> {
        let key = pair.key?;
        let value = pair.value?;

        let mut workflow = Workflow {
            name: self.cst.text(key),
            name_range: node_range(key),
            range: pair.range(),
            ..Workflow::default()
        };

        for field in self.pairs(value) {
            let Some(field_value) = field.value else {
                continue;
            };
            match self.cst.key_text(&field).as_str() {
                "jobs" => {
                    workflow.jobs_range = field.range();
                    for item in self.items(field_value) {
                        let job_ref = self.parse_job_ref(&item);
                        workflow.job_refs.push(job_ref);
                    }
                }
                "triggers" => {
                    workflow.has_triggers = true;
                    workflow.triggers_range = field.range();
                }
                _ => {}
            }
        }

        for job_ref in &workflow.job_refs {
            for requirement in &job_ref.requires {
                workflow
                    .dependencies
                    .entry(requirement.name.text.clone())
                    .or_default()
                    .push(job_ref.step_name.clone());
            }
        }

        Some(workflow)
    }

    fn parse_job_ref(&mut self, item: &Item<'t>) -> JobRef {
        let mut job_ref = JobRef {
            range: item.range(),
            ..JobRef::default()
        };

        let Some(value) = item.value else {
            job_ref.job_name_range = item_marker_range(item.node);
            return job_ref;
        };

        let Some(mapping) = self.cst.mapping_of(value) else {
            job_ref.job_name = self.cst.text(value);
            job_ref.job_name_range = node_range(value);
            job_ref.step_name = job_ref.job_name.clone();
            job_ref.step_name_range = job_ref.job_name_range;
            return job_ref;
        };

        let Some(first) = self.pairs(mapping).into_iter().next() else {
            return job_ref;
        };
        job_ref.job_name = self.cst.key_text(&first);
        job_ref.job_name_range = first.key_range();
        job_ref.step_name = job_ref.job_name.clone();
        job_ref.step_name_range = job_ref.job_name_range;

        let Some(body) = first.value else {
            return job_ref;
        };
        for field in self.pairs(body) {
            let key = self.cst.key_text(&field);
            let Some(value) = field.value else {
                continue;
            };

            match key.as_str() {
                "" => {}
                "type" => job_ref.job_type = Some(self.text_and_range(value)),
                "requires" => {
                    job_ref.requires_range = field.range();
                    job_ref.requires = self.parse_requires(value);
                }
                "name" => {
                    job_ref.step_name = self.cst.text(value);
                    job_ref.step_name_range = node_range(value);
                }
                "context" => {
                    job_ref.contexts = if self.cst.sequence_of(value).is_some() {
                        self.cst.text_list(value)
                    } else {
                        vec![self.text_and_range(value)]
                    };
                }
                "filters" | "branches" | "tags" => {}
                "matrix" => {
                    job_ref.has_matrix = true;
                    let parameters = self
                        .cst
                        .find_pair(value, "parameters")
                        .and_then(|pair| pair.value);
                    if let Some(parameters) = parameters {
                        job_ref.matrix_parameters = self.parse_parameter_values(parameters);
                    }
                }
                "pre-steps" => {
                    job_ref.pre_steps_range = field.range();
                    job_ref.pre_steps = self.parse_steps(value);
                }
                "post-steps" => {
                    job_ref.post_steps_range = field.range();
                    job_ref.post_steps = self.parse_steps(value);
                }
                "max_auto_reruns" => job_ref.max_auto_reruns = Some(self.text_and_range(value)),
                "serial-group" => job_ref.serial_group = Some(self.text_and_range(value)),
                _ => {
                    if let Some(parameter) = self.parse_parameter_value(&field) {
                        job_ref.parameters.insert(key, parameter);
                    }
                }
            }
        }
        job_ref
    }

    /// Parse `requires:` entries.
    ///
    /// A scalar entry waits for success; `job: status` and
    /// `job: [statuses]` name the accepted statuses explicitly.
    fn parse_requires(&self, node: Node<'t>) -> Vec<Requirement> {
        let mut requirements = Vec::new();
        for item in self.items(node) {
            let Some(value) = item.value else {
                continue;
            };
            let Some(mapping) = self.cst.mapping_of(value) else {
                requirements.push(Requirement::on_success(TextAndRange::new(
                    self.cst.text(value),
                    item.range(),
                )));
                continue;
            };

            for pair in self.pairs(mapping) {
                let name = TextAndRange::new(self.cst.key_text(&pair), pair.key_range());
                let Some(status) = pair.value else {
                    requirements.push(Requirement {
                        name,
                        statuses: Vec::new(),
                        status_range: pair.open_range(),
                        explicit_status: true,
                    });
                    continue;
                };
                let statuses = if self.cst.sequence_of(status).is_some() {
                    self.cst.text_list(status)
                } else {
                    vec![self.text_and_range(status)]
                };
                requirements.push(Requirement {
                    name,
                    statuses,
                    status_range: node_range(status),
                    explicit_status: true,
                });
            }
        }
        requirements
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_core::{range::Range, semantic::Value};

    use crate::Document;

    const SOURCE: &str = "\
version: 2.1
workflows:
  version: 2
  main:
    jobs:
      - lint
      - test:
          name: test-node
          requires: [lint]
          context: [org-global, aws]
          node-version: \"20\"
          matrix:
            parameters:
              os: [linux, macos]
      - deploy:
          requires:
            - test-node: [success, failed]
          serial-group: deploys
      -
    triggers:
      - schedule:
          cron: \"0 0 * * *\"
";

    #[test]
    fn test_job_refs() {
        let document = Document::parse(SOURCE).expect("grammar loads");
        let workflow = &document.workflows()["main"];

        assert_eq!(workflow.job_refs.len(), 4);
        assert!(workflow.has_triggers);

        let lint = &workflow.job_refs[0];
        assert_eq!(lint.job_name, "lint");
        assert_eq!(lint.step_name_range, Range::from_coords(5, 8, 5, 12));

        let test = workflow.job_ref("test-node").expect("test job expected");
        assert_eq!(test.job_name, "test");
        assert_eq!(test.requires[0].name.text, "lint");
        assert!(!test.requires[0].explicit_status);
        assert_eq!(test.contexts.len(), 2);
        assert_eq!(test.parameters["node-version"].value, Value::String("20".into()));
        assert!(test.has_matrix);
        assert!(test.matrix_parameters.contains_key("os"));

        let deploy = &workflow.job_refs[2];
        assert_eq!(deploy.requires[0].statuses.len(), 2);
        assert!(deploy.requires[0].explicit_status);
        assert_eq!(deploy.serial_group.as_ref().map(|group| group.text.as_str()), Some("deploys"));

        let bare = &workflow.job_refs[3];
        assert_eq!(bare.job_name, "");
        assert_eq!(bare.job_name_range, Range::from_coords(18, 7, 18, 8));
    }

    #[test]
    fn test_dependencies() {
        let document = Document::parse(SOURCE).expect("grammar loads");
        let workflow = &document.workflows()["main"];

        assert_eq!(workflow.dependencies["lint"], vec!["test-node"]);
        assert_eq!(workflow.dependencies["test-node"], vec!["deploy"]);
    }

    #[test]
    fn test_deprecated_version_key() {
        let document = Document::parse(SOURCE).expect("grammar loads");
        let diagnostic = document
            .diagnostics()
            .iter()
            .find(|d| d.message() == "Version key is deprecated since 2.1")
            .expect("deprecation expected");

        assert_eq!(diagnostic.range(), Range::from_coords(2, 2, 2, 12));
        assert_eq!(diagnostic.actions()[0].title, "Delete version key");
        assert!(!document.workflows().contains_key("version"));
    }

    #[test]
    fn test_version_key_allowed_before_2_1() {
        let source = "version: 2\nworkflows:\n  version: 2\n  main:\n    jobs: [a]\n";
        let document = Document::parse(source).expect("grammar loads");

        assert!(
            document
                .diagnostics()
                .iter()
                .all(|d| d.message() != "Version key is deprecated since 2.1")
        );
    }
}
