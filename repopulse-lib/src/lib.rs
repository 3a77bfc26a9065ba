#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for repopulse
//!
//! This library collects the repositories of a GitHub project, normalizes every entity into
//! canonical facts, and aggregates them into activity metrics.
//!
//! # Module Organization
//!
//! - [`facts`]: Canonical entity records and the activity window
//! - [`canonicalize`]: Conversion of raw REST, GraphQL and CLI payloads into facts
//! - [`source`]: The entity query seam and its GitHub implementation
//! - [`governor`]: Quota tracking, call budgeting and bounded retries
//! - [`collect`]: Per-repository and per-project collection
//! - [`aggregate`]: Metrics over collected facts
//! - [`pipeline`]: The DETECT, COLLECT and ANALYZE phases

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;
pub(crate) type HashSet<T> = std::collections::HashSet<T, rustc_hash::FxBuildHasher>;

pub mod aggregate;
pub mod canonicalize;
pub mod collect;
mod commands;
pub mod facts;
pub mod governor;
pub mod pipeline;
pub mod source;

pub use crate::commands::{Config, Host, run};
