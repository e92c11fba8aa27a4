//! The `jobs:` section.

use tree_sitter::Node;

use ciyaml_core::semantic::Job;

use crate::{
    cst::{Pair, node_range},
    parser::{DocumentParser, executors::EXECUTOR_FAMILIES, insert_first_wins},
};

impl<'t> DocumentParser<'t> {
    pub(crate) fn parse_jobs(&mut self, node: Node<'t>) {
        for pair in self.pairs(node) {
            let Some(job) = self.parse_job(&pair) else {
                continue;
            };
            let name = job.name.clone();
            insert_first_wins(
                &mut self.jobs,
                &mut self.diagnostics,
                name,
                job,
                |job| job.name_range,
                "Job already defined",
            );
        }
    }

    /// Parse one job definition. Jobs whose body is not a mapping are
    /// skipped.
    fn parse_job(&mut self, pair: &Pair<'t>) -> Option<Job> {
        let key = pair.key?;
        let mapping = pair.value.and_then(|value| self.cst.mapping_of(value))?;

        let mut job = Job {
            name: self.cst.text(key),
            name_range: node_range(key),
            range: pair.range(),
            ..Job::default()
        };
        let mut has_inline_executor = false;

        for field in self.pairs(mapping) {
            let key = self.cst.key_text(&field);
            if key == "executor" {
                job.executor = Some(self.parse_executor_ref(&field));
                continue;
            }
            let Some(value) = field.value else {
                continue;
            };

            match key.as_str() {
                "type" => job.job_type = Some(self.text_and_range(value)),
                "description" => job.description = Some(self.cst.text(value)),
                "shell" => job.shell = Some(self.cst.text(value)),
                "working_directory" => job.working_directory = Some(self.cst.text(value)),
                "parallelism" => {
                    if let Ok(parallelism) = self.cst.text(value).parse::<i8>() {
                        job.parallelism = i64::from(parallelism);
                        job.parallelism_range = field.range();
                    }
                }
                "resource_class" => {
                    job.resource_class = Some(self.cst.text(value));
                    job.resource_class_range = field.range();
                }
                "steps" => {
                    job.steps_range = field.range();
                    job.steps = self.parse_steps(value);
                }
                "parameters" => {
                    job.parameters_range = field.range();
                    job.parameters = self.parse_parameters(value);
                }
                "environment" => job.environment = self.parse_environment(value),
                "retention" => job.retention = Some(self.parse_retention(value)),
                "circleci_ip_ranges" => job.circleci_ip_ranges = self.cst.text(value) == "true",
                family if EXECUTOR_FAMILIES.contains(&family) => has_inline_executor = true,
                _ => {}
            }
        }

        if has_inline_executor {
            let mut executor = self.parse_inline_executor(mapping);
            executor.parameters = job.parameters.clone();
            executor.parameters_range = job.parameters_range;
            executor.name = job.name.clone();
            executor.name_range = job.name_range;
            executor.range = job.range;
            job.inline_executor = Some(executor);
        }

        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use ciyaml_core::range::Range;

    use crate::Document;

    #[test]
    fn test_job_fields() {
        let source = "\
jobs:
  build:
    type: build
    description: Build it
    docker:
      - image: cimg/base:stable
    resource_class: large
    parallelism: 4
    working_directory: ~/app
    environment:
      FOO: bar
    retention:
      caches: 7d
    circleci_ip_ranges: true
    steps:
      - checkout
";
        let document = Document::parse(source).expect("grammar loads");
        let job = &document.jobs()["build"];

        assert_eq!(job.name_range, Range::from_coords(1, 2, 1, 7));
        assert_eq!(job.type_name(), "build");
        assert_eq!(job.description.as_deref(), Some("Build it"));
        assert_eq!(job.parallelism, 4);
        assert_eq!(job.parallelism_range, Range::from_coords(7, 4, 7, 18));
        assert_eq!(job.resource_class.as_deref(), Some("large"));
        assert_eq!(job.steps.len(), 1);
        assert_eq!(job.environment.variables["FOO"].text, "bar");
        assert!(job.circleci_ip_ranges);

        let retention = job.retention.as_ref().expect("retention expected");
        assert_eq!(retention.caches.as_ref().map(|caches| caches.text.as_str()), Some("7d"));

        let executor = job.inline_executor.as_ref().expect("inline executor expected");
        assert_eq!(executor.docker_images()[0].image.name, "base");
        assert_eq!(executor.resource_class, "large");
    }

    #[test]
    fn test_parallelism_out_of_range_is_ignored() {
        let source = "jobs:\n  build:\n    parallelism: 1000\n    steps: [checkout]\n";
        let document = Document::parse(source).expect("grammar loads");

        assert!(!document.jobs()["build"].has_parallelism());
    }

    #[test]
    fn test_duplicate_job() {
        let source = "jobs:\n  build:\n    steps: [checkout]\n  build:\n    steps: [run]\n";
        let document = Document::parse(source).expect("grammar loads");

        let found: Vec<_> = document
            .diagnostics()
            .iter()
            .filter(|d| d.message() == "Job already defined")
            .collect();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|d| d.range() == Range::from_coords(1, 2, 1, 7)));
        assert!(found.iter().any(|d| d.range() == Range::from_coords(3, 2, 3, 7)));
    }

    #[test]
    fn test_job_without_body_is_skipped() {
        let document = Document::parse("jobs:\n  build:\n").expect("grammar loads");
        assert!(document.jobs().is_empty());
    }
}
