//! The typed configuration model.
//!
//! Entities are plain data built once by the parser and read by the
//! validation engine. Each entity records the [`Range`](crate::range::Range)
//! of its definition and of the sub-fields diagnostics point at.
//!
//! # Overview
//!
//! - [`Command`] - A reusable sequence of steps with parameters
//! - [`Job`] - A unit of work run on an executor
//! - [`Executor`] - A runtime environment (Docker, machine, macOS, Windows)
//! - [`Parameter`] - A declared, typed parameter
//! - [`ParameterValue`] - A value supplied to a parameter at a call site
//! - [`Step`] - One step of a job or command
//! - [`Workflow`] / [`JobRef`] - Job orchestration
//! - [`OrbReference`] / [`OrbInfo`] - Orb declarations and resolved orb contents

mod command;
mod environment;
mod executor;
mod job;
mod orb;
mod parameter;
mod retention;
mod step;
mod value;
mod workflow;

pub use command::Command;
pub use environment::Environment;
pub use executor::{
    AwsAuth, DockerAuth, DockerImageSpec, Executor, ExecutorKind, MacOsExecutor, MachineExecutor,
    WindowsExecutor,
};
pub use job::{Job, JobExecutorRef};
pub use orb::{OrbInfo, OrbReference, OrbUrl, VOLATILE_VERSION};
pub use parameter::{Parameter, ParameterType};
pub use retention::Retention;
pub use step::{
    AddSshKeys, AttachWorkspace, Checkout, NamedStep, PersistToWorkspace, RestoreCache, Run,
    SaveCache, SetupRemoteDocker, Step, StepsPlaceholder, StoreArtifacts, StoreTestResults,
};
pub use value::{ParameterValue, Value};
pub use workflow::{JobRef, Requirement, Workflow};
