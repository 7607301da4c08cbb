#![forbid(unsafe_code)]
//! nearmatch-core library.
//!
//! Shared vocabulary for the nearmatch engines: perceptual hash sets, report
//! fields, the error taxonomy, configuration, and the producer contracts that
//! external embedding models and image hashers implement.
//!
//! # Conventions
//!
//! - **Errors**: engine contract violations are [`error::MatchError`]; I/O and
//!   config paths use `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod producer;

pub use error::{ErrorCode, MatchError};
