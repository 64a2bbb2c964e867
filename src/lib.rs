//! Out-of-band confirmation engine for FastJson, Log4j and Spring probes.
//!
//! Scanners send probes through a rate-limited [`executor::TaskExecutor`] and
//! register them in a [`correlation::CorrelationStore`]; a
//! [`correlation::ConfirmationScheduler`] periodically matches them against
//! interactions fetched from an [`oast::OastBackend`].
//! [`pipeline::ScanEngine`] wires everything together.

pub mod archive;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod errors;
pub mod executor;
pub mod host;
pub mod models;
pub mod oast;
pub mod pipeline;
pub mod reporting;
pub mod runtime;
pub mod scanners;
pub mod utils;
