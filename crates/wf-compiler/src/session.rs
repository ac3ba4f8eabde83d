//! Compiler session
//!
//! A [`Session`] owns the four action registries while declarations are
//! added one at a time. Rule violations never abort compilation; they are
//! recorded as [`CompileError`]s and the session keeps going.
//! [`Session::compile`] consumes the session and produces the immutable
//! [`CompiledGraph`].

use crate::declaration::{ActionDeclaration, DeclarationKind};
use crate::expand::expand_dependencies;
use std::collections::BTreeMap;
use wf_adapters::Adapter;
use wf_core::{
    ActionName, ActionType, Assertion, CompileError, CompiledGraph, GraphErrors, Operation,
    ProjectConfig, Table, TableType, Target, Test,
};

/// Handle to a registered action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredAction {
    pub name: ActionName,
    pub action_type: ActionType,
}

/// Mutable compilation state
pub struct Session {
    config: ProjectConfig,
    adapter: Box<dyn Adapter>,
    tables: BTreeMap<ActionName, Table>,
    operations: BTreeMap<ActionName, Operation>,
    assertions: BTreeMap<ActionName, Assertion>,
    tests: BTreeMap<ActionName, Test>,
    errors: Vec<CompileError>,
}

impl Session {
    pub fn new(config: ProjectConfig) -> Self {
        let adapter = wf_adapters::create(&config);
        Self {
            config,
            adapter,
            tables: BTreeMap::new(),
            operations: BTreeMap::new(),
            assertions: BTreeMap::new(),
            tests: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// Compile errors recorded so far
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// Whether `name` is registered in any of the four registries
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
            || self.operations.contains_key(name)
            || self.assertions.contains_key(name)
            || self.tests.contains_key(name)
    }

    /// Record a non-fatal compile error
    pub fn compile_error(
        &mut self,
        file_name: &str,
        action_name: Option<&str>,
        message: impl Into<String>,
    ) {
        let error = CompileError {
            file_name: file_name.to_string(),
            action_name: action_name.map(str::to_string),
            message: message.into(),
        };
        log::debug!("Compile error: {}", error);
        self.errors.push(error);
    }

    /// Validate and register one declaration
    ///
    /// Returns `None` only when the declaration has no name. Every other
    /// problem is recorded as a compile error and the action is still
    /// registered; within one registry the first declaration of a name wins.
    pub fn declare(&mut self, declaration: ActionDeclaration) -> Option<DeclaredAction> {
        let Some(name) = ActionName::try_new(declaration.name.clone()) else {
            self.compile_error(
                &declaration.file_name,
                None,
                "Actions must have a non-empty name.",
            );
            return None;
        };

        for message in validate(&declaration) {
            self.compile_error(&declaration.file_name, Some(name.as_str()), message);
        }

        if self.contains(&name) {
            self.compile_error(
                &declaration.file_name,
                Some(name.as_str()),
                format!(
                    "Duplicate action name detected, names must be unique across tables, operations, assertions and tests: \"{}\"",
                    name
                ),
            );
        }

        let action_type = self.register(name.clone(), declaration);
        Some(DeclaredAction { name, action_type })
    }

    fn register(&mut self, name: ActionName, declaration: ActionDeclaration) -> ActionType {
        let database = declaration
            .database
            .clone()
            .or_else(|| self.config.default_database.clone());

        match declaration.kind {
            DeclarationKind::View
            | DeclarationKind::Table
            | DeclarationKind::Inline
            | DeclarationKind::Incremental => {
                let table_type = declaration.kind.table_type().unwrap_or_default();
                let target = self
                    .target(&name, declaration.schema.as_deref())
                    .with_database(database);
                let table = table_record(name.clone(), target, table_type, declaration);
                self.tables.entry(name).or_insert(table);
                ActionType::Table
            }
            DeclarationKind::Operations => {
                let target = declaration.has_output.then(|| {
                    self.target(&name, declaration.schema.as_deref())
                        .with_database(database)
                });
                let operation = Operation {
                    name: name.clone(),
                    target,
                    has_output: declaration.has_output,
                    queries: declaration.statements,
                    dependencies: declaration.dependencies,
                    tags: declaration.tags,
                    file_name: declaration.file_name,
                };
                self.operations.entry(name).or_insert(operation);
                ActionType::Operation
            }
            DeclarationKind::Assertion => {
                let schema = declaration
                    .schema
                    .as_deref()
                    .unwrap_or(&self.config.assertion_schema)
                    .to_string();
                let target = self.target(&name, Some(&schema)).with_database(database);
                let assertion = Assertion {
                    name: name.clone(),
                    target,
                    query: first_statement(&declaration.statements),
                    dependencies: declaration.dependencies,
                    tags: declaration.tags,
                    file_name: declaration.file_name,
                };
                self.assertions.entry(name).or_insert(assertion);
                ActionType::Assertion
            }
            DeclarationKind::Test => {
                let test = Test {
                    name: name.clone(),
                    dataset: declaration.dataset.unwrap_or_default(),
                    query: first_statement(&declaration.statements),
                    inputs: declaration.inputs,
                    file_name: declaration.file_name,
                };
                self.tests.entry(name).or_insert(test);
                ActionType::Test
            }
        }
    }

    /// Resolve an action name to its target
    ///
    /// `schema.name` splits on the first `.`; otherwise `schema` (or the
    /// project default schema) is used. The project schema suffix is always
    /// appended.
    pub fn target(&self, name: &str, schema: Option<&str>) -> Target {
        match name.split_once('.') {
            Some((explicit_schema, object)) => {
                Target::new(self.config.suffixed_schema(explicit_schema), object)
            }
            None => {
                let schema = schema.unwrap_or(&self.config.default_schema);
                Target::new(self.config.suffixed_schema(schema), name)
            }
        }
    }

    /// SQL reference to `name` for use inside another action's query
    ///
    /// Inline tables are substituted as a parenthesized subquery.
    pub fn resolve(&self, name: &str) -> String {
        if let Some(table) = self.tables.get(name) {
            return match table.table_type {
                TableType::Inline => format!("({})", table.query),
                TableType::View | TableType::Table | TableType::Incremental => {
                    self.adapter.resolve_target(&table.target)
                }
            };
        }
        let known_target = self
            .operations
            .get(name)
            .and_then(|o| o.target.as_ref())
            .or_else(|| self.assertions.get(name).map(|a| &a.target));
        match known_target {
            Some(target) => self.adapter.resolve_target(target),
            None => self.adapter.resolve_target(&self.target(name, None)),
        }
    }

    /// Finalize into a compiled graph with expanded dependencies
    pub fn compile(self) -> CompiledGraph {
        let mut graph = CompiledGraph {
            project_config: self.config,
            tables: self.tables.into_values().collect(),
            operations: self.operations.into_values().collect(),
            assertions: self.assertions.into_values().collect(),
            tests: self.tests.into_values().collect(),
            graph_errors: GraphErrors {
                compilation_errors: self.errors,
            },
        };
        expand_dependencies(&mut graph);

        log::info!(
            "Compiled {} tables, {} operations, {} assertions, {} tests ({} errors)",
            graph.tables.len(),
            graph.operations.len(),
            graph.assertions.len(),
            graph.tests.len(),
            graph.graph_errors.compilation_errors.len()
        );
        graph
    }
}

fn first_statement(statements: &[String]) -> String {
    statements.first().cloned().unwrap_or_default()
}

fn table_record(
    name: ActionName,
    target: Target,
    table_type: TableType,
    declaration: ActionDeclaration,
) -> Table {
    Table {
        name,
        target,
        table_type,
        query: first_statement(&declaration.statements),
        incremental_query: declaration.incremental_query,
        where_clause: declaration.where_clause,
        incremental_where: declaration.incremental_where,
        pre_ops: declaration.pre_operations,
        post_ops: declaration.post_operations,
        dependencies: declaration.dependencies,
        tags: declaration.tags,
        disabled: declaration.disabled,
        protected: declaration.protected,
        redshift: declaration.redshift,
        bigquery: declaration.bigquery,
        file_name: declaration.file_name,
    }
}

/// Check a declaration against the per-kind rule set
fn validate(declaration: &ActionDeclaration) -> Vec<String> {
    let kind = declaration.kind;
    let is_dataset = kind.is_dataset();
    let statement_count = declaration.statements.len();
    let mut errors = Vec::new();

    if statement_count > 1 && kind != DeclarationKind::Operations {
        errors.push(
            "Actions may only contain more than one SQL statement if they are of type 'operations'."
                .to_string(),
        );
    }
    if statement_count == 0 && kind != DeclarationKind::Operations {
        errors.push(format!(
            "Actions of type '{}' must contain a SQL query.",
            kind
        ));
    }
    if declaration.has_output && kind != DeclarationKind::Operations {
        errors.push(
            "Actions may only specify 'has_output: true' if they are of type 'operations'."
                .to_string(),
        );
    }
    if declaration.has_output && kind == DeclarationKind::Operations && statement_count != 1 {
        errors.push(
            "Operations with 'has_output: true' must contain exactly one SQL statement."
                .to_string(),
        );
    }
    if declaration.protected && kind != DeclarationKind::Incremental {
        errors.push(
            "Actions may only specify 'protected: true' if they are of type 'incremental'."
                .to_string(),
        );
    }
    if declaration.has_incremental_config() && kind != DeclarationKind::Incremental {
        errors.push(
            "Actions may only include incremental_where or incremental_query if they are of type 'incremental'."
                .to_string(),
        );
    }
    if declaration.disabled && !is_dataset {
        errors.push(
            "Actions may only specify 'disabled: true' if they create a dataset.".to_string(),
        );
    }
    if declaration.redshift.is_some() && !is_dataset {
        errors.push(
            "Actions may only specify 'redshift: { ... }' layout options if they create a dataset."
                .to_string(),
        );
    }
    if declaration.bigquery.is_some() && !is_dataset {
        errors.push(
            "Actions may only specify 'bigquery: { ... }' layout options if they create a dataset."
                .to_string(),
        );
    }
    if declaration.where_clause.is_some() && !is_dataset {
        errors.push("Actions may only include a 'where' clause if they create a dataset.".to_string());
    }
    if !declaration.pre_operations.is_empty() && !is_dataset {
        errors.push(
            "Actions may only include pre_operations if they create a dataset.".to_string(),
        );
    }
    if !declaration.post_operations.is_empty() && !is_dataset {
        errors.push(
            "Actions may only include post_operations if they create a dataset.".to_string(),
        );
    }
    match (kind, &declaration.dataset) {
        (DeclarationKind::Test, None) => {
            errors.push("Tests must specify the 'dataset' under test.".to_string());
        }
        (DeclarationKind::Test, Some(_)) | (_, None) => {}
        (_, Some(_)) => {
            errors.push(
                "Actions may only specify 'dataset' if they are of type 'test'.".to_string(),
            );
        }
    }
    if !declaration.inputs.is_empty() && kind != DeclarationKind::Test {
        errors.push("Actions may only include 'inputs' if they are of type 'test'.".to_string());
    }

    errors
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
