//! Executors: the `executors:` section, inline job executors and executor
//! references.

use tree_sitter::Node;

use ciyaml_core::{
    docker_image::parse_docker_image,
    range::{LINE_END_COLUMNS, Position, Range},
    scalar::parse_yaml_bool,
    semantic::{
        AwsAuth, DockerAuth, DockerImageSpec, Executor, ExecutorKind, JobExecutorRef,
        MacOsExecutor, MachineExecutor, WindowsExecutor,
    },
};

use crate::{
    cst::{Pair, node_range},
    parser::{DocumentParser, insert_first_wins},
};

/// Keys selecting the executor family.
pub(crate) const EXECUTOR_FAMILIES: &[&str] = &["docker", "machine", "macos", "windows"];

impl<'t> DocumentParser<'t> {
    pub(crate) fn parse_executors(&mut self, node: Node<'t>) {
        for pair in self.pairs(node) {
            let Some(key) = pair.key else {
                continue;
            };
            let Some(mapping) = pair.value.and_then(|value| self.cst.mapping_of(value)) else {
                continue;
            };

            let mut executor = self.parse_executor_body(mapping);
            executor.name = self.cst.text(key);
            executor.name_range = node_range(key);
            executor.range = pair.range();

            let name = executor.name.clone();
            insert_first_wins(
                &mut self.executors,
                &mut self.diagnostics,
                name,
                executor,
                |executor| executor.name_range,
                "Executor already defined",
            );
        }
    }

    /// Parse an executor definition, including its `parameters`.
    ///
    /// The family is taken from the first `docker`, `machine`, `macos` or
    /// `windows` key; without one the executor is incomplete.
    pub(crate) fn parse_executor_body(&mut self, mapping: Node<'t>) -> Executor {
        self.parse_executor_fields(mapping, true)
    }

    /// Parse the executor declared inline in a job body.
    ///
    /// The job owns the `parameters` of its body, so they are left to the
    /// job parser.
    pub(crate) fn parse_inline_executor(&mut self, mapping: Node<'t>) -> Executor {
        self.parse_executor_fields(mapping, false)
    }

    fn parse_executor_fields(&mut self, mapping: Node<'t>, with_parameters: bool) -> Executor {
        let mut executor = Executor::new("");

        for pair in self.pairs(mapping) {
            let key = self.cst.key_text(&pair);
            match key.as_str() {
                "docker" | "machine" | "macos" | "windows" if executor.is_incomplete() => {
                    executor.kind = self.parse_executor_kind(&key, &pair);
                }
                "resource_class" => {
                    executor.resource_class = self.cst.text_or_empty(pair.value);
                    executor.resource_class_range = pair.range();
                    if executor.resource_class.is_empty() {
                        executor.resource_class_range.end.character = LINE_END_COLUMNS;
                    }
                }
                "description" => {
                    executor.description = pair.value.map(|value| self.cst.text(value));
                }
                "shell" => executor.shell = pair.value.map(|value| self.cst.text(value)),
                "working_directory" => {
                    executor.working_directory = pair.value.map(|value| self.cst.text(value));
                }
                "environment" => {
                    if let Some(value) = pair.value {
                        executor.environment = self.parse_environment(value);
                    }
                }
                "parameters" if with_parameters => {
                    executor.parameters_range = pair.range();
                    if let Some(value) = pair.value {
                        executor.parameters = self.parse_parameters(value);
                    }
                }
                _ => {}
            }
        }
        executor
    }

    fn parse_executor_kind(&self, family: &str, pair: &Pair<'t>) -> ExecutorKind {
        match family {
            "docker" => ExecutorKind::Docker(
                pair.value
                    .map(|value| self.parse_docker_images(value))
                    .unwrap_or_default(),
            ),
            "machine" => ExecutorKind::Machine(self.parse_machine(pair)),
            "macos" => {
                let mut macos = MacOsExecutor::default();
                if let Some(xcode) = pair.value.and_then(|value| self.cst.find_pair(value, "xcode")) {
                    macos.xcode = self.cst.text_or_empty(xcode.value);
                    macos.xcode_range = xcode.range();
                }
                ExecutorKind::MacOs(macos)
            }
            _ => {
                let mut windows = WindowsExecutor::default();
                if let Some(image) = pair.value.and_then(|value| self.cst.find_pair(value, "image")) {
                    windows.image = self.cst.text_or_empty(image.value);
                    windows.image_range = image.range();
                }
                ExecutorKind::Windows(windows)
            }
        }
    }

    fn parse_machine(&self, pair: &Pair<'t>) -> MachineExecutor {
        let mut machine = MachineExecutor {
            machine_range: pair.range(),
            ..MachineExecutor::default()
        };
        let Some(value) = pair.value else {
            return machine;
        };

        if self.cst.mapping_of(value).is_none() {
            machine.is_deprecated = parse_yaml_bool(&self.cst.text(value)) == Some(true);
            return machine;
        }

        for field in self.pairs(value) {
            match self.cst.key_text(&field).as_str() {
                "image" => {
                    machine.image = self.cst.text_or_empty(field.value);
                    machine.image_range = field.range();
                }
                "docker_layer_caching" => {
                    machine.docker_layer_caching = self.cst.text_or_empty(field.value) == "true";
                }
                _ => {}
            }
        }
        machine
    }

    fn parse_docker_images(&self, node: Node<'t>) -> Vec<DockerImageSpec> {
        let mut images = Vec::new();
        for item in self.items(node) {
            let Some(mapping) = item.value.and_then(|value| self.cst.mapping_of(value)) else {
                continue;
            };
            let mut spec = DockerImageSpec {
                range: item.range(),
                ..DockerImageSpec::default()
            };

            for field in self.pairs(mapping) {
                let Some(value) = field.value else {
                    continue;
                };
                match self.cst.key_text(&field).as_str() {
                    "image" => {
                        spec.image = parse_docker_image(&self.cst.text(value));
                        spec.image_range = field.range();
                    }
                    "name" => spec.name = Some(self.cst.text(value)),
                    "entrypoint" => spec.entrypoint = self.cst.text_list_or_text(value),
                    "command" => spec.command = self.cst.text_list_or_text(value),
                    "user" => spec.user = Some(self.cst.text(value)),
                    "environment" => spec.environment = self.parse_environment(value),
                    "auth" => {
                        let dictionary = self.parse_dictionary(value);
                        spec.auth = Some(DockerAuth {
                            username: dictionary.get("username").cloned().unwrap_or_default(),
                            password: dictionary.get("password").cloned().unwrap_or_default(),
                        });
                    }
                    "aws_auth" => {
                        let dictionary = self.parse_dictionary(value);
                        let lookup = |lower: &str, upper: &str| {
                            dictionary
                                .get(lower)
                                .or_else(|| dictionary.get(upper))
                                .cloned()
                                .unwrap_or_default()
                        };
                        spec.aws_auth = Some(AwsAuth {
                            access_key_id: lookup("aws_access_key_id", "AWS_ACCESS_KEY_ID"),
                            secret_access_key: lookup(
                                "aws_secret_access_key",
                                "AWS_SECRET_ACCESS_KEY",
                            ),
                        });
                    }
                    _ => {}
                }
            }
            images.push(spec);
        }
        images
    }

    /// Parse the `executor:` key of a job.
    ///
    /// Without a value the reference range starts after the colon and runs
    /// to the end of the line.
    pub(crate) fn parse_executor_ref(&mut self, pair: &Pair<'t>) -> JobExecutorRef {
        let range = pair.range();
        let Some(value) = pair.value else {
            let start = Position::new(
                range.start.line,
                range.start.character + "executor:".len() as u32,
            );
            return JobExecutorRef {
                range: Range::new(start, start).extend_to_line_end(),
                ..JobExecutorRef::default()
            };
        };

        let Some(mapping) = self.cst.mapping_of(value) else {
            return JobExecutorRef {
                name: self.cst.text(value),
                name_range: node_range(value),
                range,
                ..JobExecutorRef::default()
            };
        };

        let mut executor_ref = JobExecutorRef {
            range,
            ..JobExecutorRef::default()
        };
        for field in self.pairs(mapping) {
            if self.cst.key_text(&field) == "name" {
                executor_ref.name = self.cst.text_or_empty(field.value);
                executor_ref.name_range = field.value_range().unwrap_or_else(|| field.range());
                continue;
            }
            if let Some(parameter) = self.parse_parameter_value(&field) {
                executor_ref
                    .parameters
                    .insert(parameter.name.clone(), parameter);
            }
        }
        executor_ref
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_core::{range::Range, semantic::ExecutorKind};

    use crate::Document;

    #[test]
    fn test_docker_executor() {
        let source = "\
executors:
  node:
    docker:
      - image: cimg/node:20.1
        auth:
          username: me
          password: $PASS
      - image: redis
        aws_auth:
          AWS_ACCESS_KEY_ID: id
          aws_secret_access_key: secret
    resource_class: large
    environment:
      CI: \"true\"
";
        let document = Document::parse(source).expect("grammar loads");
        let executor = &document.executors()["node"];

        let images = executor.docker_images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].image.name, "node");
        assert_eq!(images[0].image.tag, "20.1");
        assert_eq!(images[0].auth.as_ref().map(|auth| auth.username.as_str()), Some("me"));
        let aws = images[1].aws_auth.as_ref().expect("aws auth expected");
        assert_eq!(aws.access_key_id, "id");
        assert_eq!(aws.secret_access_key, "secret");
        assert_eq!(executor.resource_class, "large");
        assert_eq!(executor.environment.variables["CI"].text, "true");
        assert_eq!(executor.name_range, Range::from_coords(1, 2, 1, 6));
    }

    #[test]
    fn test_machine_true_is_deprecated() {
        let source = "executors:\n  old:\n    machine: true\n";
        let document = Document::parse(source).expect("grammar loads");

        let ExecutorKind::Machine(machine) = &document.executors()["old"].kind else {
            panic!("Expected machine executor");
        };
        assert!(machine.is_deprecated);
        assert_eq!(machine.machine_range, Range::from_coords(2, 4, 2, 17));
    }

    #[test]
    fn test_machine_and_macos_and_windows() {
        let source = "\
executors:
  linux:
    machine:
      image: ubuntu-2204:current
      docker_layer_caching: true
  mac:
    macos:
      xcode: 15.4.0
  win:
    windows:
      image: windows-server-2022-gui:current
";
        let document = Document::parse(source).expect("grammar loads");
        let executors = document.executors();

        let ExecutorKind::Machine(machine) = &executors["linux"].kind else {
            panic!("Expected machine executor");
        };
        assert_eq!(machine.image, "ubuntu-2204:current");
        assert!(machine.docker_layer_caching);
        assert!(matches!(&executors["mac"].kind, ExecutorKind::MacOs(m) if m.xcode == "15.4.0"));
        assert_eq!(executors["win"].family(), "windows");
    }

    #[test]
    fn test_incomplete_executor() {
        let source = "executors:\n  bare:\n    resource_class:\n";
        let document = Document::parse(source).expect("grammar loads");
        let executor = &document.executors()["bare"];

        assert!(executor.is_incomplete());
        assert_eq!(
            executor.resource_class_range.end.character,
            ciyaml_core::range::LINE_END_COLUMNS
        );
    }

    #[test]
    fn test_duplicate_executor_first_wins() {
        let source = "executors:\n  a:\n    docker:\n      - image: one\n  a:\n    docker:\n      - image: two\n";
        let document = Document::parse(source).expect("grammar loads");

        assert_eq!(document.executors()["a"].docker_images()[0].image.name, "one");
        let duplicates = document
            .diagnostics()
            .iter()
            .filter(|d| d.message() == "Executor already defined")
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_executor_reference_forms() {
        let source = "\
jobs:
  a:
    executor: node
  b:
    executor:
      name: node
      tag: \"20\"
  c:
    executor:
";
        let document = Document::parse(source).expect("grammar loads");
        let jobs = document.jobs();

        let a = jobs["a"].executor.as_ref().expect("executor expected");
        assert_eq!(a.name, "node");
        let b = jobs["b"].executor.as_ref().expect("executor expected");
        assert_eq!(b.name, "node");
        assert!(b.parameters.contains_key("tag"));
        let c = jobs["c"].executor.as_ref().expect("executor expected");
        assert_eq!(c.range, Range::from_coords(8, 13, 8, 1012));
    }
}
