//! # lmsx-export
//!
//! The export pipeline for one LMS deployment:
//!
//! 1. [`resolve`]: deployment identity, buckets and MySQL credentials from
//!    overrides, LMS config files and the bucket listing
//! 2. [`tables`]: one CSV per configured table
//! 3. [`structures`]: the course structure dump
//! 4. [`sync`]: report tree and tracking logs to object storage
//!
//! [`pipeline::Pipeline`] runs them in order under an explicit halt policy.
//! All external programs go through [`runner::CommandRunner`].

pub mod buckets;
mod error;
pub mod pipeline;
pub mod resolve;
pub mod runner;
pub mod scrape;
mod staging;
pub mod structures;
pub mod sync;
pub mod tables;

pub use error::{ExportError, ResolveError, StepError};
pub use pipeline::{Pipeline, PipelineObserver, RunOptions, Silent};
pub use resolve::{Credentials, Probe, ResolvedSettings, Resolver, SystemProbe};
pub use runner::{CommandOutput, CommandRunner, Invocation, RunAs, SystemRunner};
