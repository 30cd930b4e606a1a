//! Core article storage for the contingent-workforce portal.
//! This crate is the single source of truth for article invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use clock::{format_timestamp, Clock, ManualClock, SystemClock};
pub use config::{
    ConfigError, LegacyFormat, LegacySource, RecordDefaults, StorageKeys, StoreConfig,
    CURRENT_SCHEMA_VERSION,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::article::{
    slugify, Article, ArticleDraft, ArticleId, ArticlePatch, ArticleStatus,
};
pub use service::article_service::ArticleService;
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};
pub use store::transfer::{ExportEnvelope, ImportError};
pub use store::{
    LocationInfo, LocationState, MigrationOutcome, PersistentArticleStore, StorageInfo,
    WriteReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
