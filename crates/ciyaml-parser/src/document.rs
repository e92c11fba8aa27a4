//! The parsed document and its query surface.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};
use tree_sitter::{Node, Tree};

use ciyaml_core::{
    catalog,
    params::{self, ParamReference},
    range::{Position, Range, pos_to_index},
    semantic::{Command, Executor, Job, OrbInfo, OrbReference, Parameter, Workflow},
};

use crate::{
    anchors::{self, YamlAnchor},
    cache::Caches,
    cst::{Cst, node_range},
    error::{Diagnostic, DiagnosticCollector, ParseError},
    parser::DocumentParser,
    suppression::{self, SuppressionInfo},
    syntax,
};

/// What a source text is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    /// A pipeline configuration.
    #[default]
    Config,
    /// The body of an orb: a local orb or a registry orb source.
    Orb,
}

/// An orb declared inline under `orbs:`.
#[derive(Debug, Clone)]
pub struct LocalOrb {
    pub name: String,
    /// The range of the orb body.
    pub range: Range,
    /// The body parsed as an orb document, in the coordinates of the
    /// enclosing document. `None` if the body could not be parsed.
    pub document: Option<Box<Document>>,
}

/// A parsed configuration or orb.
///
/// Built once by [`Document::parse`] and read-only afterwards, except for
/// the diagnostics list, to which validation appends.
#[derive(Debug, Clone)]
pub struct Document {
    kind: DocumentKind,
    source: String,
    tree: Tree,

    version: f64,
    version_range: Range,
    description: Option<String>,
    orbs: IndexMap<String, OrbReference>,
    orbs_range: Range,
    local_orbs: IndexMap<String, LocalOrb>,
    executors: IndexMap<String, Executor>,
    executors_range: Range,
    commands: IndexMap<String, Command>,
    commands_range: Range,
    jobs: IndexMap<String, Job>,
    jobs_range: Range,
    workflows: IndexMap<String, Workflow>,
    workflows_range: Range,
    pipeline_parameters: IndexMap<String, Parameter>,
    pipeline_parameters_range: Range,

    anchors: IndexMap<String, YamlAnchor>,
    suppression: SuppressionInfo,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Parse a pipeline configuration.
    ///
    /// Problems in the source never make this fail: they are reported in
    /// [`Document::diagnostics`]. An error is returned only when the YAML
    /// grammar cannot be loaded or the tree cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ciyaml_parser::Document;
    /// let doc = Document::parse("version: 2.1\njobs:\n  build:\n    steps: [checkout]\n")
    ///     .expect("grammar loads");
    /// assert!(doc.does_job_exist("build"));
    /// assert_eq!(doc.version(), 2.1);
    /// ```
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        Self::parse_as(source.into(), DocumentKind::Config)
    }

    /// Parse the source of a registry orb.
    pub fn parse_orb(source: impl Into<String>) -> Result<Self, ParseError> {
        Self::parse_as(source.into(), DocumentKind::Orb)
    }

    pub(crate) fn parse_as(source: String, kind: DocumentKind) -> Result<Self, ParseError> {
        debug!(bytes = source.len(), kind:? = kind; "Parsing document");

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_yaml::LANGUAGE.into())
            .map_err(|err| Diagnostic::error(format!("Cannot load the YAML grammar: {err}")))?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Diagnostic::error("The YAML parser returned no tree"))?;

        let parsed = Parsed::build(&tree, &source, kind);
        let document = Self {
            kind,
            version: parsed.version,
            version_range: parsed.version_range,
            description: parsed.description,
            orbs: parsed.orbs,
            orbs_range: parsed.orbs_range,
            local_orbs: parsed.local_orbs,
            executors: parsed.executors,
            executors_range: parsed.executors_range,
            commands: parsed.commands,
            commands_range: parsed.commands_range,
            jobs: parsed.jobs,
            jobs_range: parsed.jobs_range,
            workflows: parsed.workflows,
            workflows_range: parsed.workflows_range,
            pipeline_parameters: parsed.pipeline_parameters,
            pipeline_parameters_range: parsed.pipeline_parameters_range,
            anchors: parsed.anchors,
            suppression: parsed.suppression,
            diagnostics: parsed.diagnostics,
            source,
            tree,
        };
        trace!(
            jobs = document.jobs.len(),
            commands = document.commands.len(),
            executors = document.executors.len(),
            workflows = document.workflows.len(),
            diagnostics = document.diagnostics.len();
            "Parsed document"
        );
        Ok(document)
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The declared `version`, `0.0` when absent or not a number.
    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn version_range(&self) -> Range {
        self.version_range
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn orbs(&self) -> &IndexMap<String, OrbReference> {
        &self.orbs
    }

    pub fn orbs_range(&self) -> Range {
        self.orbs_range
    }

    pub fn local_orbs(&self) -> &IndexMap<String, LocalOrb> {
        &self.local_orbs
    }

    pub fn local_orb(&self, name: &str) -> Option<&LocalOrb> {
        self.local_orbs.get(name)
    }

    pub fn executors(&self) -> &IndexMap<String, Executor> {
        &self.executors
    }

    pub fn executors_range(&self) -> Range {
        self.executors_range
    }

    pub fn commands(&self) -> &IndexMap<String, Command> {
        &self.commands
    }

    pub fn commands_range(&self) -> Range {
        self.commands_range
    }

    pub fn jobs(&self) -> &IndexMap<String, Job> {
        &self.jobs
    }

    pub fn jobs_range(&self) -> Range {
        self.jobs_range
    }

    pub fn workflows(&self) -> &IndexMap<String, Workflow> {
        &self.workflows
    }

    pub fn workflows_range(&self) -> Range {
        self.workflows_range
    }

    pub fn pipeline_parameters(&self) -> &IndexMap<String, Parameter> {
        &self.pipeline_parameters
    }

    pub fn pipeline_parameters_range(&self) -> Range {
        self.pipeline_parameters_range
    }

    /// Every anchor of the document, in definition order.
    pub fn anchors(&self) -> &IndexMap<String, YamlAnchor> {
        &self.anchors
    }

    pub fn suppression(&self) -> &SuppressionInfo {
        &self.suppression
    }

    /// All diagnostics found so far, suppressed ones included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagnostics left after applying the suppression directives.
    pub fn visible_diagnostics(&self) -> Vec<Diagnostic> {
        self.suppression.filter(self.diagnostics.iter().cloned())
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Run `f` over a navigation view of the syntax tree.
    ///
    /// The node passed to `f` is the value of the top-level document, or the
    /// tree root when the document is empty.
    pub fn with_cst<R>(&self, f: impl for<'a> FnOnce(&Cst<'a>, Node<'a>) -> R) -> R {
        let root = self.tree.root_node();
        let table = anchors::scan(root, &self.source);
        let cst = Cst::new(&self.source, table.value_nodes);
        let top = top_level_node(root).unwrap_or(root);
        f(&cst, top)
    }

    /// The range of the deepest node reached by following `path`.
    ///
    /// Each segment is a mapping key, merge keys included, or the index of a
    /// sequence item. The walk stops at the first segment that does not
    /// resolve; with no resolvable segment the whole document is returned.
    pub fn path_range<S: AsRef<str>>(&self, path: &[S]) -> Range {
        self.with_cst(|cst, root| {
            let mut range = node_range(root);
            let mut current = Some(root);
            for segment in path {
                let segment = segment.as_ref();
                let Some(node) = current else {
                    break;
                };

                if cst.sequence_of(node).is_some() {
                    let Ok(index) = segment.parse::<usize>() else {
                        break;
                    };
                    let mut items = Vec::new();
                    cst.for_each_item(node, |item| items.push(item));
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    range = item.range();
                    current = item.value;
                } else {
                    let Some(pair) = cst.find_pair(node, segment) else {
                        break;
                    };
                    range = pair.key_range();
                    current = pair.value;
                }
            }
            range
        })
    }

    /// Copy the entity maps into an [`OrbInfo`].
    pub fn to_orb_info(&self, id: impl Into<String>, version: impl Into<String>) -> OrbInfo {
        OrbInfo {
            id: id.into(),
            version: version.into(),
            source: self.source.clone(),
            description: self.description.clone(),
            commands: self.commands.clone(),
            jobs: self.jobs.clone(),
            executors: self.executors.clone(),
            pipeline_parameters: self.pipeline_parameters.clone(),
            ..OrbInfo::default()
        }
    }

    pub fn does_job_exist(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn does_command_exist(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn does_executor_exist(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    pub fn does_workflow_exist(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    /// Returns `true` if `name` is a job, an executor, an orb entity or,
    /// when `include_commands` is set, a command.
    pub fn does_command_or_job_or_executor_exist(&self, name: &str, include_commands: bool) -> bool {
        self.does_job_exist(name)
            || (include_commands && self.does_command_exist(name))
            || self.does_executor_exist(name)
            || self.is_orb_reference(name)
    }

    /// Returns `true` for the step names handled by the platform.
    pub fn is_built_in(&self, name: &str) -> bool {
        catalog::is_built_in_step(name)
    }

    /// Returns `true` if a step name is written as an alias.
    pub fn is_alias(&self, name: &str) -> bool {
        name.starts_with('*')
    }

    /// Returns `true` if `name` has the `orb/entity` shape, whether or not
    /// the orb is declared.
    pub fn could_be_orb_reference(&self, name: &str) -> bool {
        split_orb_reference(name).is_some()
    }

    /// Returns `true` if `name` is `orb/entity` for a declared orb.
    pub fn is_orb_reference(&self, name: &str) -> bool {
        split_orb_reference(name).is_some_and(|(orb, _)| self.orbs.contains_key(orb))
    }

    /// Returns `true` if `name` is an entity of the declared orb `orb`.
    pub fn is_given_orb(&self, name: &str, orb: &str) -> bool {
        self.is_orb_reference(name) && split_orb_reference(name).is_some_and(|(prefix, _)| prefix == orb)
    }

    /// The contents of a declared orb.
    ///
    /// Local orbs are built from their parsed body. Registry orbs are looked
    /// up in `caches` by `name@version` and are `None` until resolved.
    pub fn orb_info(&self, caches: &Caches, name: &str) -> Option<Arc<OrbInfo>> {
        let orb = self.orbs.get(name)?;
        if orb.url.is_local {
            return self.local_orb_info(name).map(Arc::new);
        }
        caches.orb(&orb.url.id())
    }

    /// The contents of a local orb.
    pub fn local_orb_info(&self, name: &str) -> Option<OrbInfo> {
        let document = self.local_orbs.get(name)?.document.as_ref()?;
        let mut info = document.to_orb_info(name, "");
        info.is_local = true;
        Some(info)
    }

    pub fn is_orb_command(&self, caches: &Caches, name: &str) -> bool {
        self.orb_entity(caches, name, |info, entity| info.commands.contains_key(entity))
    }

    pub fn is_orb_job(&self, caches: &Caches, name: &str) -> bool {
        self.orb_entity(caches, name, |info, entity| info.jobs.contains_key(entity))
    }

    pub fn is_orb_executor(&self, caches: &Caches, name: &str) -> bool {
        self.orb_entity(caches, name, |info, entity| info.executors.contains_key(entity))
    }

    fn orb_entity(&self, caches: &Caches, name: &str, has: impl Fn(&OrbInfo, &str) -> bool) -> bool {
        let Some((orb, entity)) = split_orb_reference(name) else {
            return false;
        };
        self.orb_info(caches, orb)
            .is_some_and(|info| has(&info, entity))
    }

    /// Returns `true` if `name` refers into a declared registry orb whose
    /// contents are unknown, so references into it cannot be checked.
    pub fn is_from_unfetchable_orb(&self, caches: &Caches, name: &str) -> bool {
        let Some((orb, _)) = split_orb_reference(name) else {
            return false;
        };
        let Some(reference) = self.orbs.get(orb) else {
            return false;
        };
        if reference.url.is_local {
            return false;
        }
        params::contains_substitution(&reference.url.version)
            || caches.orb(&reference.url.id()).is_none()
    }

    /// The parameters declared by a command or job, including orb commands
    /// and jobs written as `orb/entity`.
    pub fn defined_params(&self, caches: &Caches, name: &str) -> Option<IndexMap<String, Parameter>> {
        if let Some(job) = self.jobs.get(name) {
            return Some(job.parameters.clone());
        }
        if let Some(command) = self.commands.get(name) {
            return Some(command.parameters.clone());
        }
        let (orb, entity) = split_orb_reference(name)?;
        let info = self.orb_info(caches, orb)?;
        info.entity_parameters(entity).cloned()
    }

    /// The parameters in scope at `position`: those of the command, job or
    /// executor whose definition contains it, looking into local orbs.
    pub fn params_at(&self, position: Position) -> Option<&IndexMap<String, Parameter>> {
        if self.commands_range.contains(position) {
            let found = self
                .commands
                .values()
                .find(|command| command.range.contains(position));
            if let Some(command) = found {
                return Some(&command.parameters);
            }
        }

        if self.jobs_range.contains(position) {
            let found = self.jobs.values().find(|job| job.range.contains(position));
            if let Some(job) = found {
                return Some(&job.parameters);
            }
        }

        if self.orbs_range.contains(position) {
            return self
                .local_orbs
                .values()
                .filter(|orb| orb.range.contains(position))
                .find_map(|orb| orb.document.as_ref())
                .and_then(|document| document.params_at(position));
        }

        if self.executors_range.contains(position) {
            return self.executor_at(position).map(|executor| &executor.parameters);
        }

        None
    }

    /// The executor whose definition contains `position`.
    pub fn executor_at(&self, position: Position) -> Option<&Executor> {
        self.executors
            .values()
            .find(|executor| executor.range.contains(position))
    }

    /// The parameter reference under `position`, if any.
    pub fn param_name_used_at(&self, position: Position) -> Option<ParamReference> {
        let index = pos_to_index(position, &self.source)?;
        if !self.source.is_char_boundary(index) {
            return None;
        }
        params::param_name_used_at(&self.source, index)
    }

    /// The anchor defined or referenced at `position`.
    pub fn anchor_at(&self, position: Position) -> Option<&YamlAnchor> {
        self.anchors.values().find(|anchor| {
            anchor.definition_range.contains(position)
                || anchor
                    .references
                    .iter()
                    .any(|reference| reference.contains(position))
        })
    }

    /// Returns `true` if `position` is on an alias.
    pub fn is_alias_position(&self, position: Position) -> bool {
        self.anchors.values().any(|anchor| {
            anchor
                .references
                .iter()
                .any(|reference| reference.contains(position))
        })
    }
}

/// The owned results of one parse pass.
struct Parsed {
    version: f64,
    version_range: Range,
    description: Option<String>,
    orbs: IndexMap<String, OrbReference>,
    orbs_range: Range,
    local_orbs: IndexMap<String, LocalOrb>,
    executors: IndexMap<String, Executor>,
    executors_range: Range,
    commands: IndexMap<String, Command>,
    commands_range: Range,
    jobs: IndexMap<String, Job>,
    jobs_range: Range,
    workflows: IndexMap<String, Workflow>,
    workflows_range: Range,
    pipeline_parameters: IndexMap<String, Parameter>,
    pipeline_parameters_range: Range,
    anchors: IndexMap<String, YamlAnchor>,
    suppression: SuppressionInfo,
    diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    /// Run the parse pipeline: anchor scan, syntax checks, entity parsers,
    /// then suppression directives.
    ///
    /// Syntax checks and suppression directives belong to the file being
    /// edited, so orb bodies skip them.
    fn build(tree: &Tree, source: &str, kind: DocumentKind) -> Self {
        let root = tree.root_node();
        let table = anchors::scan(root, source);
        let cst = Cst::new(source, table.value_nodes.clone());

        let mut diagnostics = DiagnosticCollector::new();
        if kind == DocumentKind::Config {
            syntax::check(root, &cst, &table, &mut diagnostics);
        }

        let mut parser = DocumentParser::new(cst);
        if let Some(top) = top_level_node(root) {
            parser.parse_root(top);
        }
        diagnostics.extend(parser.diagnostics.into_diagnostics());

        let suppression = match kind {
            DocumentKind::Config => suppression::scan(root, source, &mut diagnostics),
            DocumentKind::Orb => SuppressionInfo::default(),
        };

        Self {
            version: parser.version,
            version_range: parser.version_range,
            description: parser.description,
            orbs: parser.orbs,
            orbs_range: parser.orbs_range,
            local_orbs: parser.local_orbs,
            executors: parser.executors,
            executors_range: parser.executors_range,
            commands: parser.commands,
            commands_range: parser.commands_range,
            jobs: parser.jobs,
            jobs_range: parser.jobs_range,
            workflows: parser.workflows,
            workflows_range: parser.workflows_range,
            pipeline_parameters: parser.pipeline_parameters,
            pipeline_parameters_range: parser.pipeline_parameters_range,
            anchors: table.anchors,
            suppression,
            diagnostics: diagnostics.into_diagnostics(),
        }
    }
}

/// The value node of the first YAML document below the stream root.
fn top_level_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    let document = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "document")?;
    let mut cursor = document.walk();
    document
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "block_node" | "flow_node"))
}

/// Split `orb/entity`. Names with no slash or more than one are not orb
/// references.
fn split_orb_reference(name: &str) -> Option<(&str, &str)> {
    let (orb, entity) = name.split_once('/')?;
    if entity.contains('/') {
        return None;
    }
    Some((orb, entity))
}
