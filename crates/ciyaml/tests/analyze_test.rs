//! Integration tests for the Analyzer API
//!
//! These tests drive whole configurations through parsing, orb resolution,
//! validation and suppression.

use std::fs;

use ciyaml::{
    Analyzer, CiyamlError, Diagnostic,
    config::{AppConfig, SchemaConfig, ValidationConfig},
    docker_hub::InMemoryDockerHub,
    registry::InMemoryRegistry,
};

fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(Diagnostic::message).collect()
}

fn analyze(source: &str) -> Vec<Diagnostic> {
    Analyzer::default()
        .analyze(source)
        .expect("Failed to analyze")
        .into_diagnostics()
}

#[test]
fn test_unused_job() {
    let source = "\
version: 2.1
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
  lint:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  main:
    jobs: [build]
";
    let diagnostics = analyze(source);
    let unused: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.message() == "Job is unused")
        .collect();

    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].range().start.line, 6);
    assert!(!unused[0].severity().is_error());
}

#[test]
fn test_macos_executor() {
    let with_xcode = |xcode: &str| {
        format!(
            "version: 2.1\njobs:\n  build:\n    macos:\n      xcode: {xcode}\n    resource_class: large\n    steps: [checkout]\nworkflows:\n  main:\n    jobs: [build]\n"
        )
    };

    let valid = analyze(&with_xcode("11.3.1"));
    assert!(
        valid.iter().all(|d| !d.message().contains("Xcode")
            && !d.message().contains("resource class")),
        "{:?}",
        messages(&valid)
    );

    let invalid = analyze(&with_xcode("\"12.5\""));
    let errors: Vec<_> = invalid
        .iter()
        .filter(|d| d.message() == "Invalid Xcode version 12.5")
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].severity().is_error());
}

#[test]
fn test_requires_cycle_and_downstream_jobs() {
    let source = "\
version: 2.1
jobs:
  a:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
  b:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
  c:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  main:
    jobs:
      - a:
          requires: [b]
      - b:
          requires: [a]
      - c:
          requires: [a]
";
    let diagnostics = analyze(source);
    let cycle = messages(&diagnostics)
        .into_iter()
        .filter(|message| message.contains("is part of a cycle"))
        .collect::<Vec<_>>();

    assert_eq!(cycle.len(), 3);
    assert!(cycle.contains(&"The job `a` is part of a cycle"));
    assert!(cycle.contains(&"The job `b` is part of a cycle"));
    assert!(cycle.contains(&"The job `c` is part of a cycle"));
}

#[test]
fn test_enum_default_outside_values() {
    let source = "\
version: 2.1
jobs:
  build:
    parameters:
      size:
        type: enum
        enum: [small, large]
        default: medium
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  main:
    jobs: [build]
";
    let analysis = Analyzer::default().analyze(source).expect("Failed to analyze");
    let errors: Vec<_> = analysis
        .diagnostics()
        .iter()
        .filter(|d| d.severity().is_error())
        .collect();

    assert_eq!(errors.len(), 1, "{:?}", messages(analysis.diagnostics()));
    assert!(analysis.has_errors());
}

#[test]
fn test_suppression_directives() {
    let broken = "\
version: 2.1
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  main:
    jobs:
      - build
      - deploy
";
    let reported = analyze(broken);
    assert!(messages(&reported).contains(&"Cannot find declaration for job deploy"));

    let file_wide = format!("# cci-ignore-file\n{broken}");
    assert!(analyze(&file_wide).is_empty());

    let inline = broken.replace("      - deploy\n", "      - deploy # cci-ignore\n");
    let analysis = Analyzer::default().analyze(&inline).expect("Failed to analyze");
    assert!(!analysis.has_errors(), "{:?}", messages(analysis.diagnostics()));
    assert!(
        analysis
            .document()
            .diagnostics()
            .iter()
            .any(|d| d.message() == "Cannot find declaration for job deploy"),
        "suppressed diagnostics stay on the document"
    );
}

#[test]
fn test_orb_version_quick_fixes() {
    let orb = "version: 2.1\ncommands:\n  install:\n    steps:\n      - run: npm ci\n";
    let registry = InMemoryRegistry::new()
        .with_orb("acme/node", "1.0.0", orb)
        .with_orb("acme/node", "1.0.3", orb)
        .with_orb("acme/node", "1.2.0", orb)
        .with_orb("acme/node", "2.0.0", orb);
    let source = "\
version: 2.1
orbs:
  node: acme/node@1.0.0
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
    steps:
      - node/install
workflows:
  main:
    jobs: [build]
";

    let analysis = Analyzer::default()
        .with_registry(registry)
        .analyze(source)
        .expect("Failed to analyze");
    let stale = analysis
        .diagnostics()
        .iter()
        .find(|d| d.message().starts_with("A newer patched version exists."))
        .expect("stale version is reported");

    let titles: Vec<&str> = stale.actions().iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Update to last patch (1.0.3)",
            "Update to last minor (1.2.0)",
            "Update to last version (2.0.0)"
        ]
    );
    assert_eq!(stale.actions()[0].edits[0].new_text, "1.0.3");
    assert_eq!(stale.range().start.line, 2);
}

#[test]
fn test_docker_hub_checks() {
    let config = AppConfig::new(
        ValidationConfig::new(true, false, true, true),
        Default::default(),
        Default::default(),
        Default::default(),
    );
    let hub = InMemoryDockerHub::new().with_image("cimg", "node", ["22.1", "20.11"]);
    let analyzer = Analyzer::new(config)
        .expect("valid configuration")
        .with_docker_hub(hub);
    let source = "\
version: 2.1
jobs:
  build:
    docker:
      - image: cimg/node:16.0
      - image: cimg/rust:1.80
    steps: [checkout]
workflows:
  main:
    jobs: [build]
";

    let analysis = analyzer.analyze(source).expect("Failed to analyze");
    let found = messages(analysis.diagnostics());

    assert!(found.contains(&"Docker image \"cimg/node:16.0\" has no tag \"16.0\""));
    assert!(found.contains(&"Docker image not found \"cimg/rust:1.80\""));
    assert!(analyzer.caches().docker_tags("cimg/node").is_some());
}

#[test]
fn test_analyzer_reuse_shares_orb_cache() {
    let orb = "version: 2.1\ncommands:\n  install:\n    steps:\n      - run: npm ci\n";
    let analyzer =
        Analyzer::default().with_registry(InMemoryRegistry::new().with_orb("acme/node", "1.0.0", orb));
    let source = "\
version: 2.1
orbs:
  node: acme/node@1.0.0
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
    steps: [node/install]
workflows:
  main:
    jobs: [build]
";

    let first = analyzer.analyze(source).expect("Failed to analyze");
    let second = analyzer.analyze(source).expect("Failed to analyze");

    assert_eq!(
        messages(first.diagnostics()),
        messages(second.diagnostics())
    );
    assert!(analyzer.caches().orb("acme/node@1.0.0").is_some());
}

#[test]
fn test_inline_executor_parameters_reported_once() {
    let source = "\
version: 2.1
jobs:
  build:
    parameters:
      flavor:
        type: enum
        enum: [small, large]
        default: medium
      steps_param:
        type: steps
        default: [{}]
    docker:
      - image: cimg/base:2024.01
    steps: [checkout]
workflows:
  main:
    jobs: [build]
";
    let diagnostics = analyze(source);

    let enum_errors = diagnostics
        .iter()
        .filter(|d| d.message() == "Default value medium is not in enum 'small, large'")
        .count();
    assert_eq!(enum_errors, 1, "{:?}", messages(&diagnostics));
    let invalid_steps = messages(&diagnostics)
        .into_iter()
        .filter(|message| *message == "Not a valid step")
        .count();
    assert_eq!(invalid_steps, 1);

    let mut seen = std::collections::HashSet::new();
    for diagnostic in &diagnostics {
        assert!(
            seen.insert((diagnostic.message(), diagnostic.range())),
            "duplicated diagnostic {:?}",
            diagnostic.message()
        );
    }
}

#[test]
fn test_schema_from_configuration() {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("schema.json");
    fs::write(
        &path,
        r#"{
  "type": "object",
  "properties": {
    "jobs": {
      "type": "object",
      "additionalProperties": {"type": "object", "required": ["steps"]}
    },
    "workflows": {
      "type": "object",
      "additionalProperties": {
        "type": "object",
        "properties": {"when": {"type": "object"}}
      }
    }
  }
}"#,
    )
    .expect("Failed to write schema");
    let config = AppConfig::default().with_schema(SchemaConfig::new(Some(path)));
    let analyzer = Analyzer::new(config).expect("valid configuration");

    let source = "\
version: 2.1
parameters:
  nightly:
    type: boolean
    default: false
jobs:
  build:
    docker:
      - image: cimg/base:2024.01
workflows:
  main:
    when: << pipeline.parameters.nightly >>
    jobs: [build]
";
    let analysis = analyzer.analyze(source).expect("Failed to analyze");
    let shape: Vec<_> = analysis
        .diagnostics()
        .iter()
        .filter(|d| d.code().map(|code| code.as_str()) == Some("E105"))
        .collect();

    assert_eq!(shape.len(), 1, "{:?}", messages(analysis.diagnostics()));
    assert!(shape[0].message().contains("steps"));
    assert_eq!(shape[0].range().start.line, 6);
}

#[test]
fn test_missing_schema_is_a_configuration_error() {
    let config = AppConfig::default()
        .with_schema(SchemaConfig::new(Some("/nonexistent/schema.json".into())));

    assert!(matches!(Analyzer::new(config), Err(CiyamlError::Config(_))));
}
