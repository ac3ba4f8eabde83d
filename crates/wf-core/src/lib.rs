//! wf-core - Core library for Weft
//!
//! This crate provides the action model, project and run configuration,
//! SQL task records, observed warehouse metadata, the compiled graph
//! document and the action DAG shared by every other Weft crate.

pub mod action;
pub mod action_name;
pub mod compiled;
pub mod config;
pub mod dag;
pub mod error;
pub mod metadata;
pub mod pattern;
pub mod sql_utils;
pub mod target;
pub mod task;

pub use action::{
    ActionRef, ActionType, Assertion, BigQueryOptions, Operation, RedshiftOptions, Table,
    TableType, Test,
};
pub use action_name::ActionName;
pub use compiled::{CompileError, CompiledGraph, GraphErrors};
pub use config::{ProjectConfig, RunConfig, WarehouseType};
pub use dag::ActionDag;
pub use error::{CoreError, CoreResult};
pub use metadata::{RelationType, TableMetadata};
pub use target::Target;
pub use task::{Task, TaskType, Tasks};
