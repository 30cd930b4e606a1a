//! Article domain model.
//!
//! # Responsibility
//! - Define the record shape shared by storage, services and the CLI.
//!
//! # Invariants
//! - Every article is identified by a stable `ArticleId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod article;
