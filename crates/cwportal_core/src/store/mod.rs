//! Redundant article store over injected key-value backends.
//!
//! # Responsibility
//! - Keep the whole article collection in a primary key, ordered backup keys
//!   and a session-scoped mirror.
//! - Migrate older key layouts when the schema-version marker changes.
//! - Recover by reading locations in priority order and healing the primary.
//!
//! # Invariants
//! - After a fully successful save, primary and every backup hold the same
//!   serialized collection. Writes are sequential, not transactional.
//! - No public operation fails: storage and parse errors are logged per
//!   location and the next location is tried.
//! - A read that finds data only in a backup or the session mirror re-saves
//!   it to every location.

use crate::clock::{format_timestamp, Clock, SystemClock};
use crate::config::{LegacyFormat, LegacySource, StoreConfig};
use crate::model::article::{Article, ArticleDraft, ArticlePatch};
use crate::storage::KeyValueStorage;
use log::{debug, error, info, warn};

pub mod legacy;
pub mod samples;
pub mod transfer;

use legacy::decode_articles;
use samples::sample_articles;
use transfer::{parse_import_payload, ExportEnvelope};

/// How `migrate_existing_data` populated the current layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Records were copied from the first non-empty legacy source.
    Imported { source_key: String, count: usize },
    /// No legacy data existed; sample articles were written.
    Seeded { count: usize },
}

/// Per-location result of a multi-key write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl WriteReport {
    /// True when every attempted location succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.succeeded.is_empty()
    }
}

/// What one storage location currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationState {
    Missing,
    Articles(usize),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub location: String,
    pub bytes: usize,
    pub state: LocationState,
}

/// Diagnostic snapshot of every location the store manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    pub expected_schema: String,
    pub stored_schema: Option<String>,
    pub locations: Vec<LocationInfo>,
}

/// Article store writing the full collection to several locations.
pub struct PersistentArticleStore<P: KeyValueStorage, S: KeyValueStorage> {
    config: StoreConfig,
    persistent: P,
    session: S,
    clock: Box<dyn Clock>,
    initialized: bool,
}

impl<P: KeyValueStorage, S: KeyValueStorage> PersistentArticleStore<P, S> {
    /// Creates a store over the given persistent and session backends.
    pub fn new(config: StoreConfig, persistent: P, session: S) -> Self {
        Self {
            config,
            persistent,
            session,
            clock: Box::new(SystemClock),
            initialized: false,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn persistent(&self) -> &P {
        &self.persistent
    }

    pub fn persistent_mut(&mut self) -> &mut P {
        &mut self.persistent
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Releases the backends, e.g. to reopen them with a fresh store.
    pub fn into_parts(self) -> (P, S) {
        (self.persistent, self.session)
    }

    /// Runs migration when the stored schema marker differs from the
    /// configured version. Later calls on the same store are no-ops.
    pub fn initialize(&mut self) -> Option<MigrationOutcome> {
        if self.initialized {
            return None;
        }
        self.initialized = true;

        let marker_key = self.config.keys.version_marker.clone();
        let stored = match self.persistent.get_item(&marker_key) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=store_init module=store status=degraded key={} error={}",
                    marker_key, err
                );
                None
            }
        };

        if stored.as_deref() == Some(self.config.schema_version.as_str()) {
            debug!(
                "event=store_init module=store status=ok schema={}",
                self.config.schema_version
            );
            return None;
        }

        info!(
            "event=store_migrate module=store status=start from_schema={} to_schema={}",
            stored.as_deref().unwrap_or("none"),
            self.config.schema_version
        );
        let outcome = self.migrate_existing_data();

        let version = self.config.schema_version.clone();
        if let Err(err) = self.persistent.set_item(&marker_key, &version) {
            error!(
                "event=store_migrate module=store status=error key={} error={}",
                marker_key, err
            );
        }
        Some(outcome)
    }

    /// Copies the first non-empty source into the current layout, or seeds
    /// the sample articles when none exists. The configured primary key is
    /// always scanned first, so existing data survives a schema bump or a
    /// lost marker whatever the key is named.
    pub fn migrate_existing_data(&mut self) -> MigrationOutcome {
        let now = self.now();
        let primary = LegacySource::new(self.config.keys.primary.clone(), LegacyFormat::BareArray);
        let sources = std::iter::once(&primary).chain(
            self.config
                .legacy_sources
                .iter()
                .filter(|source| source.key != primary.key),
        );

        let mut found = None;
        for source in sources {
            let Some(raw) = read_raw(&self.persistent, &source.key) else {
                continue;
            };
            match decode_articles(&raw, source.format, &self.config.defaults, &now) {
                Ok(articles) if !articles.is_empty() => {
                    found = Some((source.key.clone(), articles));
                    break;
                }
                Ok(_) => {}
                Err(err) => warn!(
                    "event=store_migrate module=store status=skip key={} error={}",
                    source.key, err
                ),
            }
        }

        match found {
            Some((source_key, articles)) => {
                self.save_articles(&articles);
                info!(
                    "event=store_migrate module=store status=ok source={} count={}",
                    source_key,
                    articles.len()
                );
                MigrationOutcome::Imported {
                    source_key,
                    count: articles.len(),
                }
            }
            None => {
                let articles = sample_articles(&self.config.defaults, &now);
                self.save_articles(&articles);
                info!(
                    "event=store_migrate module=store status=seeded count={}",
                    articles.len()
                );
                MigrationOutcome::Seeded {
                    count: articles.len(),
                }
            }
        }
    }

    /// Writes the collection to the primary key, each backup key in order,
    /// then the session mirror. Individual failures are logged and skipped.
    pub fn save_articles(&mut self, articles: &[Article]) -> WriteReport {
        let mut report = WriteReport::default();
        let serialized = match serde_json::to_string(articles) {
            Ok(value) => value,
            Err(err) => {
                error!("event=articles_save module=store status=error error_code=serialize_failed error={err}");
                return report;
            }
        };

        let keys = std::iter::once(&self.config.keys.primary).chain(self.config.keys.backups.iter());
        for key in keys {
            match self.persistent.set_item(key, &serialized) {
                Ok(()) => report.succeeded.push(key.clone()),
                Err(err) => {
                    warn!(
                        "event=articles_save module=store status=degraded key={} error={}",
                        key, err
                    );
                    report.failed.push(key.clone());
                }
            }
        }

        let session_name = session_location(&self.config.keys.session);
        match self.session.set_item(&self.config.keys.session, &serialized) {
            Ok(()) => report.succeeded.push(session_name),
            Err(err) => {
                warn!(
                    "event=articles_save module=store status=degraded key={} error={}",
                    session_name, err
                );
                report.failed.push(session_name);
            }
        }

        if report.succeeded.is_empty() {
            error!(
                "event=articles_save module=store status=error count={} error_code=no_location_written",
                articles.len()
            );
        } else {
            debug!(
                "event=articles_save module=store status=ok count={} written={} failed={}",
                articles.len(),
                report.succeeded.len(),
                report.failed.len()
            );
        }
        report
    }

    /// Returns the first non-empty collection found in primary, backups,
    /// then the session mirror, healing the primary from a fallback hit.
    /// Re-seeds the samples when every location is empty or unreadable.
    pub fn load_articles(&mut self) -> Vec<Article> {
        self.initialize();

        let keys: Vec<String> = std::iter::once(self.config.keys.primary.clone())
            .chain(self.config.keys.backups.iter().cloned())
            .collect();
        for (index, key) in keys.iter().enumerate() {
            let Some(articles) = self.read_location(Location::Persistent(key)) else {
                continue;
            };
            if index > 0 {
                warn!(
                    "event=articles_load module=store status=recovered source={} count={}",
                    key,
                    articles.len()
                );
                self.save_articles(&articles);
            }
            return articles;
        }

        let session_key = self.config.keys.session.clone();
        if let Some(articles) = self.read_location(Location::Session(&session_key)) {
            warn!(
                "event=articles_load module=store status=recovered source={} count={}",
                session_location(&session_key),
                articles.len()
            );
            self.save_articles(&articles);
            return articles;
        }

        warn!("event=articles_load module=store status=reseeded");
        let articles = sample_articles(&self.config.defaults, &self.now());
        self.save_articles(&articles);
        articles
    }

    /// Appends a new article built from `draft` and persists the collection.
    pub fn save_article(&mut self, draft: ArticleDraft) -> Article {
        let mut articles = self.load_articles();
        let article = Article::from_draft(draft, &self.config.defaults, &self.now());
        articles.push(article.clone());
        self.save_articles(&articles);
        info!("event=article_create module=store status=ok id={}", article.id);
        article
    }

    /// Merges `patch` into the article with `id`. Returns `None` without
    /// writing when no article matches.
    pub fn update_article(&mut self, id: &str, patch: ArticlePatch) -> Option<Article> {
        let mut articles = self.load_articles();
        let Some(position) = articles.iter().position(|article| article.id == id) else {
            debug!("event=article_update module=store status=not_found id={id}");
            return None;
        };

        let now = self.now();
        articles[position].apply_patch(patch, &now);
        let updated = articles[position].clone();
        self.save_articles(&articles);
        info!(
            "event=article_update module=store status=ok id={} version={}",
            updated.id, updated.version
        );
        Some(updated)
    }

    /// Removes the article with `id`. Returns `false` without writing when
    /// nothing matched.
    pub fn delete_article(&mut self, id: &str) -> bool {
        let mut articles = self.load_articles();
        let before = articles.len();
        articles.retain(|article| article.id != id);
        if articles.len() == before {
            debug!("event=article_delete module=store status=not_found id={id}");
            return false;
        }

        self.save_articles(&articles);
        info!("event=article_delete module=store status=ok id={id}");
        true
    }

    pub fn get_article(&mut self, id: &str) -> Option<Article> {
        self.load_articles()
            .into_iter()
            .find(|article| article.id == id)
    }

    pub fn get_article_by_slug(&mut self, slug: &str) -> Option<Article> {
        self.load_articles()
            .into_iter()
            .find(|article| article.slug == slug)
    }

    pub fn published_articles(&mut self) -> Vec<Article> {
        self.load_articles()
            .into_iter()
            .filter(Article::is_published)
            .collect()
    }

    /// Serializes the current collection as a pretty-printed export envelope.
    pub fn export_articles(&mut self) -> String {
        let envelope = ExportEnvelope {
            version: self.config.schema_version.clone(),
            export_date: self.now(),
            articles: self.load_articles(),
        };
        match serde_json::to_string_pretty(&envelope) {
            Ok(json) => {
                info!(
                    "event=articles_export module=store status=ok count={}",
                    envelope.articles.len()
                );
                json
            }
            Err(err) => {
                error!("event=articles_export module=store status=error error={err}");
                String::from("[]")
            }
        }
    }

    /// Replaces the whole collection with the payload's records.
    ///
    /// Returns `false` and leaves storage untouched when the payload is not
    /// valid JSON, not an array or envelope, or contains a non-object record.
    pub fn import_articles(&mut self, json: &str) -> bool {
        let now = self.now();
        let articles = match parse_import_payload(json, &self.config.defaults, &now) {
            Ok(articles) => articles,
            Err(err) => {
                warn!("event=articles_import module=store status=rejected error={err}");
                return false;
            }
        };

        self.save_articles(&articles);
        info!(
            "event=articles_import module=store status=ok count={}",
            articles.len()
        );
        true
    }

    /// Reports what every managed location holds, without migrating or healing.
    pub fn storage_info(&self) -> StorageInfo {
        let mut locations = Vec::new();
        let keys = std::iter::once(&self.config.keys.primary).chain(self.config.keys.backups.iter());
        for key in keys {
            locations.push(inspect(&self.persistent, key, key.clone()));
        }
        locations.push(inspect(
            &self.session,
            &self.config.keys.session,
            session_location(&self.config.keys.session),
        ));

        StorageInfo {
            expected_schema: self.config.schema_version.clone(),
            stored_schema: read_raw(&self.persistent, &self.config.keys.version_marker),
            locations,
        }
    }

    /// Removes every managed key, including the schema marker.
    pub fn clear_all(&mut self) -> WriteReport {
        let mut report = WriteReport::default();
        let keys: Vec<String> = std::iter::once(&self.config.keys.primary)
            .chain(self.config.keys.backups.iter())
            .chain(std::iter::once(&self.config.keys.version_marker))
            .cloned()
            .collect();
        for key in keys {
            match self.persistent.remove_item(&key) {
                Ok(()) => report.succeeded.push(key),
                Err(err) => {
                    warn!("event=store_clear module=store status=degraded key={key} error={err}");
                    report.failed.push(key);
                }
            }
        }

        let location = session_location(&self.config.keys.session);
        match self.session.remove_item(&self.config.keys.session) {
            Ok(()) => report.succeeded.push(location),
            Err(err) => {
                warn!("event=store_clear module=store status=degraded key={location} error={err}");
                report.failed.push(location);
            }
        }

        self.initialized = false;
        info!(
            "event=store_clear module=store status=ok cleared={} failed={}",
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }

    fn read_location(&self, location: Location<'_>) -> Option<Vec<Article>> {
        let (raw, name) = match location {
            Location::Persistent(key) => (read_raw(&self.persistent, key)?, key.to_string()),
            Location::Session(key) => (read_raw(&self.session, key)?, session_location(key)),
        };
        match decode_articles(
            &raw,
            LegacyFormat::BareArray,
            &self.config.defaults,
            &self.now(),
        ) {
            Ok(articles) if !articles.is_empty() => Some(articles),
            Ok(_) => None,
            Err(err) => {
                warn!(
                    "event=articles_load module=store status=skip key={} error={}",
                    name, err
                );
                None
            }
        }
    }

    fn now(&self) -> String {
        format_timestamp(self.clock.now())
    }
}

enum Location<'a> {
    Persistent(&'a str),
    Session(&'a str),
}

fn session_location(key: &str) -> String {
    format!("session:{key}")
}

fn read_raw(storage: &impl KeyValueStorage, key: &str) -> Option<String> {
    match storage.get_item(key) {
        Ok(value) => value,
        Err(err) => {
            warn!("event=storage_read module=store status=skip key={key} error={err}");
            None
        }
    }
}

fn inspect(storage: &impl KeyValueStorage, key: &str, location: String) -> LocationInfo {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return LocationInfo {
                location,
                bytes: 0,
                state: LocationState::Missing,
            }
        }
        Err(err) => {
            return LocationInfo {
                location,
                bytes: 0,
                state: LocationState::Unreadable(err.to_string()),
            }
        }
    };

    let state = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::Array(records)) => LocationState::Articles(records.len()),
        Ok(_) => LocationState::Unreadable("not a json array".to_string()),
        Err(err) => LocationState::Unreadable(err.to_string()),
    };
    LocationInfo {
        location,
        bytes: raw.len(),
        state,
    }
}
