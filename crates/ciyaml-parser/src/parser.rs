//! Entity parsers: syntax tree to typed model.
//!
//! [`DocumentParser`] walks the top-level mapping of a document and
//! dispatches each section to the parser in the matching submodule. Every
//! parser tolerates missing or malformed input: absent children are skipped
//! and partially written entities are kept with whatever fields were found.
//!
//! Sections are parsed in a fixed order whatever their order in the source:
//! `version` and `orbs` first, since later sections read the version and
//! refer to orbs, and `workflows` last.

mod commands;
mod executors;
mod jobs;
mod orbs;
mod parameters;
mod retention;
mod steps;
mod values;
mod workflows;

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};
use tree_sitter::Node;

use ciyaml_core::{
    range::{Range, TextAndRange},
    semantic::{Command, Environment, Executor, Job, OrbReference, Parameter, Workflow},
};

use crate::{
    cst::{Cst, Item, Pair, node_range},
    document::LocalOrb,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
};

/// Top-level sections, in the order they are parsed.
const SECTION_ORDER: &[&str] = &[
    "version",
    "description",
    "orbs",
    "executors",
    "commands",
    "jobs",
    "parameters",
    "workflows",
];

/// Builds the typed model of one document.
pub(crate) struct DocumentParser<'t> {
    pub(crate) cst: Cst<'t>,
    pub(crate) diagnostics: DiagnosticCollector,

    pub(crate) version: f64,
    pub(crate) version_range: Range,
    pub(crate) description: Option<String>,
    pub(crate) orbs: IndexMap<String, OrbReference>,
    pub(crate) orbs_range: Range,
    pub(crate) local_orbs: IndexMap<String, LocalOrb>,
    pub(crate) executors: IndexMap<String, Executor>,
    pub(crate) executors_range: Range,
    pub(crate) commands: IndexMap<String, Command>,
    pub(crate) commands_range: Range,
    pub(crate) jobs: IndexMap<String, Job>,
    pub(crate) jobs_range: Range,
    pub(crate) workflows: IndexMap<String, Workflow>,
    pub(crate) workflows_range: Range,
    pub(crate) pipeline_parameters: IndexMap<String, Parameter>,
    pub(crate) pipeline_parameters_range: Range,
}

impl<'t> DocumentParser<'t> {
    pub(crate) fn new(cst: Cst<'t>) -> Self {
        Self {
            cst,
            diagnostics: DiagnosticCollector::new(),
            version: 0.0,
            version_range: Range::default(),
            description: None,
            orbs: IndexMap::new(),
            orbs_range: Range::default(),
            local_orbs: IndexMap::new(),
            executors: IndexMap::new(),
            executors_range: Range::default(),
            commands: IndexMap::new(),
            commands_range: Range::default(),
            jobs: IndexMap::new(),
            jobs_range: Range::default(),
            workflows: IndexMap::new(),
            workflows_range: Range::default(),
            pipeline_parameters: IndexMap::new(),
            pipeline_parameters_range: Range::default(),
        }
    }

    /// Parse every known section of the top-level mapping held by `root`.
    pub(crate) fn parse_root(&mut self, root: Node<'t>) {
        let mut sections: HashMap<String, Pair<'t>> = HashMap::new();
        self.cst.for_each_pair(root, |pair| {
            let key = self.cst.key_text(&pair);
            sections.entry(key).or_insert(pair);
        });

        for section in SECTION_ORDER {
            let Some(pair) = sections.get(*section).copied() else {
                continue;
            };
            trace!(section = section; "Parsing section");
            self.parse_section(section, pair);
        }

        self.assign_contexts();
    }

    fn parse_section(&mut self, section: &str, pair: Pair<'t>) {
        let value = pair.value;
        let section_range = pair.value_range().unwrap_or_else(|| pair.range());

        match section {
            "version" => {
                self.version_range = pair.range();
                if let Some(value) = value {
                    self.version = self.cst.text(value).parse().unwrap_or_default();
                }
            }
            "description" => {
                self.description = value.map(|value| self.cst.text(value));
            }
            "orbs" => {
                self.orbs_range = section_range;
                match value {
                    Some(value) => self.parse_orbs(value),
                    None => self.warn_empty_section(&pair),
                }
            }
            "executors" => {
                self.executors_range = section_range;
                match value {
                    Some(value) => self.parse_executors(value),
                    None => self.warn_empty_section(&pair),
                }
            }
            "commands" => {
                self.commands_range = section_range;
                if let Some(value) = value {
                    self.parse_commands(value);
                }
            }
            "jobs" => {
                if let Some(value) = value {
                    self.jobs_range = section_range;
                    self.parse_jobs(value);
                }
            }
            "parameters" => {
                self.pipeline_parameters_range = section_range;
                match value {
                    Some(value) => self.pipeline_parameters = self.parse_parameters(value),
                    None => self.warn_empty_section(&pair),
                }
            }
            "workflows" => {
                if let Some(value) = value {
                    self.workflows_range = section_range;
                    self.parse_workflows(value);
                }
            }
            _ => {}
        }
    }

    fn warn_empty_section(&mut self, pair: &Pair<'t>) {
        self.diagnostics.emit(
            Diagnostic::warning("Empty assignation")
                .with_code(ErrorCode::E101)
                .with_range(pair.range()),
        );
    }

    /// Propagate the contexts of workflow job references to the referenced
    /// jobs and to the jobs and commands their steps invoke.
    fn assign_contexts(&mut self) {
        let assignments: Vec<(String, String)> = self
            .workflows
            .values()
            .flat_map(|workflow| &workflow.job_refs)
            .flat_map(|job_ref| {
                job_ref
                    .contexts
                    .iter()
                    .map(|context| (job_ref.job_name.clone(), context.text.clone()))
            })
            .collect();

        for (job_name, context) in assignments {
            let Some(job) = self.jobs.get_mut(&job_name) else {
                continue;
            };
            push_unique(&mut job.contexts, &context);

            let invoked: Vec<String> = job.steps.iter().map(|step| step.name().to_string()).collect();
            for name in invoked {
                if let Some(command) = self.commands.get_mut(&name) {
                    push_unique(&mut command.contexts, &context);
                } else if let Some(job) = self.jobs.get_mut(&name) {
                    push_unique(&mut job.contexts, &context);
                }
            }
        }
    }

    /// The pairs of the mapping held by `node`, merge keys expanded.
    pub(crate) fn pairs(&self, node: Node<'t>) -> Vec<Pair<'t>> {
        let mut pairs = Vec::new();
        self.cst.for_each_pair(node, |pair| pairs.push(pair));
        pairs
    }

    /// The items of the sequence held by `node`.
    pub(crate) fn items(&self, node: Node<'t>) -> Vec<Item<'t>> {
        let mut items = Vec::new();
        self.cst.for_each_item(node, |item| items.push(item));
        items
    }

    /// The text of a value with the value's own range.
    pub(crate) fn text_and_range(&self, node: Node<'t>) -> TextAndRange {
        TextAndRange::new(self.cst.text(node), node_range(node))
    }

    /// Parse an `environment:` mapping.
    pub(crate) fn parse_environment(&self, node: Node<'t>) -> Environment {
        let mut environment = Environment {
            range: node_range(node),
            variables: IndexMap::new(),
        };
        self.cst.for_each_pair(node, |pair| {
            let key = self.cst.key_text(&pair);
            if key.is_empty() {
                return;
            }
            let value = self.cst.text_or_empty(pair.value);
            environment
                .variables
                .insert(key, TextAndRange::new(value, pair.range()));
        });
        environment
    }

    /// Parse a mapping of plain strings, such as `auth:`.
    pub(crate) fn parse_dictionary(&self, node: Node<'t>) -> IndexMap<String, String> {
        let mut dictionary = IndexMap::new();
        self.cst.for_each_pair(node, |pair| {
            if let Some(value) = pair.value {
                dictionary.insert(self.cst.key_text(&pair), self.cst.text(value));
            }
        });
        dictionary
    }
}

fn push_unique(contexts: &mut Vec<String>, context: &str) {
    if !contexts.iter().any(|existing| existing == context) {
        contexts.push(context.to_string());
    }
}

/// Insert `entity` unless `name` is already defined.
///
/// A duplicate is reported on both definitions and dropped: the first
/// definition wins.
pub(crate) fn insert_first_wins<T>(
    map: &mut IndexMap<String, T>,
    diagnostics: &mut DiagnosticCollector,
    name: String,
    entity: T,
    name_range_of: impl Fn(&T) -> Range,
    message: &str,
) {
    if let Some(existing) = map.get(&name) {
        debug!(name = name.as_str(); "Duplicate definition");
        let first = name_range_of(existing);
        let second = name_range_of(&entity);
        diagnostics.emit(
            Diagnostic::warning(message)
                .with_code(ErrorCode::E100)
                .with_label(second, "defined again here")
                .with_secondary_label(first, "first defined here"),
        );
        diagnostics.emit(
            Diagnostic::warning(message)
                .with_code(ErrorCode::E100)
                .with_range(first),
        );
        return;
    }
    map.insert(name, entity);
}

/// The range a valueless key reports at: right after the pair, to the end
/// of the line.
pub(crate) fn after_pair_range(pair: &Pair<'_>) -> Range {
    let range = pair.range();
    Range::new(range.end, range.end).extend_to_line_end()
}
