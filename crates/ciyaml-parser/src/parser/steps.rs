//! Steps of jobs, commands and `steps` parameters.

use tree_sitter::Node;

use ciyaml_core::{
    params::extract_param_name,
    semantic::{
        AddSshKeys, AttachWorkspace, Checkout, NamedStep, PersistToWorkspace, RestoreCache, Run,
        SaveCache, SetupRemoteDocker, Step, StepsPlaceholder, StoreArtifacts, StoreTestResults,
    },
};

use crate::{
    cst::{Item, Pair, item_marker_range, node_range},
    parser::DocumentParser,
};

impl<'t> DocumentParser<'t> {
    /// Parse a sequence of steps.
    pub(crate) fn parse_steps(&mut self, node: Node<'t>) -> Vec<Step> {
        let mut steps = Vec::new();
        for item in self.items(node) {
            steps.extend(self.parse_single_step(&item));
        }
        steps
    }

    /// Parse one item of a steps sequence.
    ///
    /// `when` and `unless` items expand to their nested steps, so an item
    /// yields any number of steps.
    pub(crate) fn parse_single_step(&mut self, item: &Item<'t>) -> Vec<Step> {
        let Some(value) = item.value else {
            return vec![Step::Named(NamedStep {
                range: item_marker_range(item.node),
                ..NamedStep::default()
            })];
        };

        let Some(mapping) = self.cst.mapping_of(value) else {
            if value.kind() == "flow_node" {
                return vec![Step::Named(NamedStep {
                    name: self.cst.text(value),
                    range: node_range(value),
                    ..NamedStep::default()
                })];
            }
            return vec![Step::Run(Run {
                range: node_range(value),
                ..Run::default()
            })];
        };

        let Some(pair) = self.pairs(mapping).into_iter().next() else {
            return Vec::new();
        };
        let Some(step_value) = pair.value else {
            return Vec::new();
        };

        let key = self.cst.key_text(&pair);
        let step = match key.as_str() {
            "run" => Step::Run(self.parse_run(&pair, step_value, false)),
            "deploy" => Step::Run(self.parse_run(&pair, step_value, true)),
            "checkout" => Step::Checkout(self.parse_checkout(&pair, step_value)),
            "setup_remote_docker" => {
                Step::SetupRemoteDocker(self.parse_setup_remote_docker(&pair, step_value))
            }
            "save_cache" => Step::SaveCache(self.parse_save_cache(&pair, step_value)),
            "restore_cache" => Step::RestoreCache(self.parse_restore_cache(&pair, step_value)),
            "store_artifacts" => Step::StoreArtifacts(self.parse_store_artifacts(&pair, step_value)),
            "store_test_results" => {
                Step::StoreTestResults(self.parse_store_test_results(&pair, step_value))
            }
            "persist_to_workspace" => {
                Step::PersistToWorkspace(self.parse_persist_to_workspace(&pair, step_value))
            }
            "attach_workspace" => {
                Step::AttachWorkspace(self.parse_attach_workspace(&pair, step_value))
            }
            "add_ssh_keys" => Step::AddSshKeys(self.parse_add_ssh_keys(&pair, step_value)),
            "when" | "unless" => return self.parse_conditional_steps(step_value),
            "steps" => {
                let value = self.cst.text(step_value);
                let (_, name) = extract_param_name(&value);
                Step::Steps(StepsPlaceholder {
                    range: pair.value_range().unwrap_or_else(|| pair.range()),
                    value_range: node_range(step_value),
                    name,
                    value,
                })
            }
            _ => Step::Named(self.parse_named_step(key, &pair, step_value)),
        };
        vec![step]
    }

    fn parse_conditional_steps(&mut self, node: Node<'t>) -> Vec<Step> {
        let mut steps = Vec::new();
        for pair in self.pairs(node) {
            let Some(value) = pair.value else {
                continue;
            };
            if self.cst.key_text(&pair) == "steps" {
                steps.extend(self.parse_steps(value));
            }
        }
        steps
    }

    fn parse_named_step(&mut self, name: String, pair: &Pair<'t>, value: Node<'t>) -> NamedStep {
        let mut step = NamedStep {
            name,
            range: pair.key_range(),
            ..NamedStep::default()
        };
        if let Some(mapping) = self.cst.mapping_of(value) {
            step.parameters_range = node_range(mapping);
            for param in self.pairs(mapping) {
                if self.cst.key_text(&param).is_empty() {
                    continue;
                }
                if let Some(parameter) = self.parse_parameter_value(&param) {
                    step.parameters.insert(parameter.name.clone(), parameter);
                }
            }
        }
        step
    }

    fn parse_run(&self, pair: &Pair<'t>, value: Node<'t>, is_deploy: bool) -> Run {
        let mut run = Run {
            range: pair.key_range(),
            is_deploy,
            ..Run::default()
        };

        let Some(mapping) = self.cst.mapping_of(value) else {
            run.command = self.cst.text(value);
            run.raw_command = self.cst.raw_text(value).to_string();
            run.command_range = node_range(value);
            return run;
        };

        for field in self.pairs(mapping) {
            let Some(field_value) = field.value else {
                continue;
            };
            let text = || self.cst.text(field_value);
            match self.cst.key_text(&field).as_str() {
                "name" => run.name = Some(text()),
                "command" => {
                    run.command = text();
                    run.raw_command = self.cst.raw_text(field_value).to_string();
                    run.command_range = node_range(field_value);
                }
                "shell" => run.shell = Some(text()),
                "background" => run.background = text() == "true",
                "working_directory" => run.working_directory = Some(text()),
                "no_output_timeout" => run.no_output_timeout = Some(text()),
                "when" => run.when = Some(self.text_and_range(field_value)),
                "max_auto_reruns" => run.max_auto_reruns = Some(self.text_and_range(field_value)),
                "auto_rerun_delay" => run.auto_rerun_delay = Some(self.text_and_range(field_value)),
                "environment" => run.environment = self.parse_environment(field_value),
                _ => {}
            }
        }
        run
    }

    fn parse_checkout(&self, pair: &Pair<'t>, value: Node<'t>) -> Checkout {
        let mut checkout = Checkout {
            range: pair.key_range(),
            ..Checkout::default()
        };
        if let Some(path) = self.field(value, "path") {
            checkout.path = self.cst.text(path);
        }
        checkout
    }

    fn parse_setup_remote_docker(&self, pair: &Pair<'t>, value: Node<'t>) -> SetupRemoteDocker {
        SetupRemoteDocker {
            range: pair.key_range(),
            docker_layer_caching: self
                .field(value, "docker_layer_caching")
                .is_some_and(|node| self.cst.text(node) == "true"),
            version: self.field(value, "version").map(|node| self.cst.text(node)),
        }
    }

    fn parse_save_cache(&self, pair: &Pair<'t>, value: Node<'t>) -> SaveCache {
        SaveCache {
            range: pair.key_range(),
            name: self.field(value, "name").map(|node| self.cst.text(node)),
            key: self.cst.text_or_empty(self.field(value, "key")),
            paths: self.field_list(value, "paths"),
        }
    }

    fn parse_restore_cache(&self, pair: &Pair<'t>, value: Node<'t>) -> RestoreCache {
        RestoreCache {
            range: pair.key_range(),
            name: self.field(value, "name").map(|node| self.cst.text(node)),
            key: self.field(value, "key").map(|node| self.cst.text(node)),
            keys: self.field_list(value, "keys"),
        }
    }

    fn parse_store_artifacts(&self, pair: &Pair<'t>, value: Node<'t>) -> StoreArtifacts {
        StoreArtifacts {
            range: pair.key_range(),
            path: self.cst.text_or_empty(self.field(value, "path")),
            destination: self.field(value, "destination").map(|node| self.cst.text(node)),
        }
    }

    fn parse_store_test_results(&self, pair: &Pair<'t>, value: Node<'t>) -> StoreTestResults {
        StoreTestResults {
            range: pair.key_range(),
            path: self.cst.text_or_empty(self.field(value, "path")),
        }
    }

    fn parse_persist_to_workspace(&self, pair: &Pair<'t>, value: Node<'t>) -> PersistToWorkspace {
        PersistToWorkspace {
            range: pair.key_range(),
            root: self.cst.text_or_empty(self.field(value, "root")),
            paths: self.field_list(value, "paths"),
        }
    }

    fn parse_attach_workspace(&self, pair: &Pair<'t>, value: Node<'t>) -> AttachWorkspace {
        AttachWorkspace {
            range: pair.key_range(),
            at: self.cst.text_or_empty(self.field(value, "at")),
        }
    }

    fn parse_add_ssh_keys(&self, pair: &Pair<'t>, value: Node<'t>) -> AddSshKeys {
        AddSshKeys {
            range: pair.key_range(),
            fingerprints: self.field_list(value, "fingerprints"),
        }
    }

    /// The value of `key` in the mapping held by `node`.
    fn field(&self, node: Node<'t>, key: &str) -> Option<Node<'t>> {
        self.cst.find_pair(node, key).and_then(|pair| pair.value)
    }

    fn field_list(&self, node: Node<'t>, key: &str) -> Vec<String> {
        self.field(node, key)
            .map(|value| {
                self.cst
                    .text_list(value)
                    .into_iter()
                    .map(|entry| entry.text)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_core::{range::Range, semantic::Step};

    use crate::Document;

    fn steps_of(source: &str) -> Vec<Step> {
        let document = Document::parse(source).expect("grammar loads");
        document.jobs()["build"].steps.clone()
    }

    #[test]
    fn test_bare_dash_is_empty_named_step() {
        let steps = steps_of("jobs:\n  build:\n    steps:\n      -\n      - checkout\n");

        assert_eq!(steps.len(), 2);
        let Step::Named(empty) = &steps[0] else {
            panic!("Expected named step");
        };
        assert_eq!(empty.name, "");
        assert_eq!(empty.range, Range::from_coords(3, 7, 3, 8));
        assert!(matches!(&steps[1], Step::Named(step) if step.name == "checkout"));
    }

    #[test]
    fn test_run_forms() {
        let source = "\
jobs:
  build:
    steps:
      - run: echo one
      - run: |
          echo two
          echo three
      - run:
          name: Four
          command: echo four
          background: true
          when: always
";
        let steps = steps_of(source);

        let Step::Run(inline) = &steps[0] else {
            panic!("Expected run step");
        };
        assert_eq!(inline.command, "echo one");
        assert_eq!(inline.range, Range::from_coords(3, 8, 3, 11));

        let Step::Run(block) = &steps[1] else {
            panic!("Expected run step");
        };
        assert_eq!(block.command, "echo two\necho three");
        assert_eq!(block.range.start.line, 4);

        let Step::Run(mapping) = &steps[2] else {
            panic!("Expected run step");
        };
        assert_eq!(mapping.name.as_deref(), Some("Four"));
        assert_eq!(mapping.command, "echo four");
        assert!(mapping.background);
        assert_eq!(mapping.when.as_ref().map(|when| when.text.as_str()), Some("always"));
    }

    #[test]
    fn test_builtin_steps() {
        let source = "\
jobs:
  build:
    steps:
      - checkout:
          path: src
      - save_cache:
          key: v1
          paths: [node_modules, .cache]
      - restore_cache:
          keys:
            - v1
      - persist_to_workspace:
          root: .
          paths: [dist]
      - attach_workspace:
          at: /tmp
      - add_ssh_keys:
          fingerprints: [\"ab:cd\"]
      - setup_remote_docker:
          docker_layer_caching: true
";
        let steps = steps_of(source);

        assert!(matches!(&steps[0], Step::Checkout(step) if step.path == "src"));
        assert!(matches!(&steps[1], Step::SaveCache(step) if step.paths.len() == 2 && step.key == "v1"));
        assert!(matches!(&steps[2], Step::RestoreCache(step) if step.keys == vec!["v1"]));
        assert!(matches!(&steps[3], Step::PersistToWorkspace(step) if step.root == "."));
        assert!(matches!(&steps[4], Step::AttachWorkspace(step) if step.at == "/tmp"));
        assert!(matches!(&steps[5], Step::AddSshKeys(step) if step.fingerprints == vec!["ab:cd"]));
        assert!(matches!(&steps[6], Step::SetupRemoteDocker(step) if step.docker_layer_caching));
    }

    #[test]
    fn test_when_expands_nested_steps() {
        let source = "\
jobs:
  build:
    steps:
      - when:
          condition: true
          steps:
            - checkout
            - run: make
";
        let steps = steps_of(source);

        assert_eq!(steps.len(), 2);
        assert!(matches!(steps[1], Step::Run(_)));
    }

    #[test]
    fn test_steps_placeholder() {
        let steps = steps_of("jobs:\n  build:\n    steps:\n      - steps: << parameters.extra >>\n");

        let Step::Steps(placeholder) = &steps[0] else {
            panic!("Expected steps placeholder");
        };
        assert_eq!(placeholder.name, "extra");
    }

    #[test]
    fn test_named_step_parameters() {
        let source = "jobs:\n  build:\n    steps:\n      - node/install:\n          version: \"20\"\n";
        let steps = steps_of(source);

        let Step::Named(step) = &steps[0] else {
            panic!("Expected named step");
        };
        assert_eq!(step.name, "node/install");
        assert_eq!(step.range, Range::from_coords(3, 8, 3, 20));
        assert!(step.parameters.contains_key("version"));
    }
}
