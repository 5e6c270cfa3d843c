//! # lmsx-core
//!
//! Core types shared by every lmsx crate.
//!
//! - [`DeploymentIdentity`]: the bare `host.domain` partition key
//! - [`TableExportSpec`]: declarative description of one exported table
//! - [`ReportLayout`]: the on-disk report tree and its path conventions
//! - [`StepOutcome`], [`StepReport`], [`RunReport`]: per-step results
//! - [`HaltPolicy`], [`BucketAmbiguity`]: explicit run policies
//! - [`CoreError`]: validation errors

pub mod errors;
pub mod identity;
pub mod layout;
pub mod outcome;
pub mod policy;
pub mod tables;

pub use errors::CoreError;
pub use identity::{DeploymentIdentity, strip_decoration};
pub use layout::{ReportLayout, STRUCTURES_NAME};
pub use outcome::{RunMode, RunReport, StepKind, StepOutcome, StepReport};
pub use policy::{BucketAmbiguity, HaltPolicy};
pub use tables::{DEFAULT_OUTPUT_TEMPLATE, DEFAULT_TABLES, TableExportSpec, default_tables};
