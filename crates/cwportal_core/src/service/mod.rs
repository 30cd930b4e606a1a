//! Use-case services.
//!
//! # Responsibility
//! - Expose article use-cases to callers without leaking storage layout.

pub mod article_service;
