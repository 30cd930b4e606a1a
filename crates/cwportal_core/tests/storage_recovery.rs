use cwportal_core::{
    ArticleDraft, ArticleService, KeyValueStorage, LocationState, ManualClock, MemoryStorage,
    PersistentArticleStore, StoreConfig,
};

const PRIMARY: &str = "cw_articles";
const BACKUPS: [&str; 3] = [
    "cw_articles_backup_1",
    "cw_articles_backup_2",
    "cw_articles_backup_3",
];

fn memory_store() -> PersistentArticleStore<MemoryStorage, MemoryStorage> {
    PersistentArticleStore::new(
        StoreConfig::default(),
        MemoryStorage::new(),
        MemoryStorage::new(),
    )
    .with_clock(ManualClock::ticking())
}

#[test]
fn save_writes_identical_copies_everywhere() {
    let mut store = memory_store();
    store.save_article(ArticleDraft::titled("Replicated"));

    let primary = store.persistent().get_item(PRIMARY).unwrap().unwrap();
    for backup in BACKUPS {
        assert_eq!(
            store.persistent().get_item(backup).unwrap().as_deref(),
            Some(primary.as_str())
        );
    }
    assert_eq!(
        store.session().get_item(PRIMARY).unwrap().as_deref(),
        Some(primary.as_str())
    );
}

#[test]
fn cleared_primary_is_recovered_from_backup_and_healed() {
    let mut store = memory_store();
    store.save_article(ArticleDraft::titled("Survivor"));
    let before = store.load_articles();

    store.persistent_mut().remove_item(PRIMARY).unwrap();
    let loaded = store.load_articles();

    assert_eq!(loaded, before);
    let primary = store.persistent().get_item(PRIMARY).unwrap();
    assert!(primary.is_some());
    assert_eq!(primary, store.persistent().get_item(BACKUPS[0]).unwrap());
}

#[test]
fn corrupted_primary_and_first_backup_are_skipped() {
    let mut store = memory_store();
    let created = store.save_article(ArticleDraft::titled("Hidden in backup"));

    store
        .persistent_mut()
        .set_item(PRIMARY, "{ truncated")
        .unwrap();
    store
        .persistent_mut()
        .set_item(BACKUPS[0], "not json at all")
        .unwrap();

    let loaded = store.load_articles();
    assert!(loaded.iter().any(|article| article.id == created.id));

    let healed = store.persistent().get_item(PRIMARY).unwrap().unwrap();
    assert!(healed.contains(&created.id));
    let first_backup = store.persistent().get_item(BACKUPS[0]).unwrap().unwrap();
    assert_eq!(first_backup, healed);
}

#[test]
fn failing_backup_does_not_abort_save() {
    let mut store = memory_store();
    let articles = store.load_articles();
    store.persistent_mut().block_key(BACKUPS[1]);

    let report = store.save_articles(&articles);
    assert_eq!(report.failed, vec![BACKUPS[1].to_string()]);
    assert_eq!(
        report.succeeded,
        vec![
            PRIMARY.to_string(),
            BACKUPS[0].to_string(),
            BACKUPS[2].to_string(),
            format!("session:{PRIMARY}"),
        ]
    );
    assert!(!report.is_complete());
    assert!(store.persistent().get_item(BACKUPS[2]).unwrap().is_some());
}

#[test]
fn quota_exhaustion_degrades_redundancy_only() {
    let mut store = PersistentArticleStore::new(
        StoreConfig::default(),
        MemoryStorage::with_quota(64 * 1024),
        MemoryStorage::new(),
    )
    .with_clock(ManualClock::ticking());
    store.load_articles();

    let big_body = format!("<p>{}</p>", "x".repeat(20 * 1024));
    let created = store.save_article(ArticleDraft {
        title: Some("Large".to_string()),
        content: Some(big_body),
        ..ArticleDraft::default()
    });

    let primary = store.persistent().get_item(PRIMARY).unwrap().unwrap();
    assert!(primary.contains(&created.id));
    let last_backup = store.persistent().get_item(BACKUPS[2]).unwrap();
    assert!(last_backup.map_or(true, |raw| !raw.contains(&created.id)));
    assert!(store
        .load_articles()
        .iter()
        .any(|article| article.id == created.id));
}

#[test]
fn session_mirror_is_last_persistent_fallback() {
    let mut store = memory_store();
    let created = store.save_article(ArticleDraft::titled("Session only"));

    store.persistent_mut().remove_item(PRIMARY).unwrap();
    for backup in BACKUPS {
        store.persistent_mut().remove_item(backup).unwrap();
    }

    let loaded = store.load_articles();
    assert!(loaded.iter().any(|article| article.id == created.id));
    assert!(store
        .persistent()
        .get_item(PRIMARY)
        .unwrap()
        .unwrap()
        .contains(&created.id));
}

#[test]
fn disabled_persistent_storage_still_serves_from_session() {
    let store = PersistentArticleStore::new(
        StoreConfig::default(),
        MemoryStorage::disabled(),
        MemoryStorage::new(),
    )
    .with_clock(ManualClock::ticking());
    let mut service = ArticleService::new(store);

    let created = service.save_article(ArticleDraft::titled("Ephemeral"));
    let articles = service.get_articles();
    assert_eq!(articles.len(), 3);
    assert!(articles.iter().any(|article| article.id == created.id));
}

#[test]
fn empty_locations_fall_back_to_samples() {
    let mut store = memory_store();
    assert!(store.import_articles("[]"));

    let articles = store.load_articles();
    assert_eq!(articles.len(), 2);
    assert!(articles.iter().all(|article| article.id.starts_with("sample-")));
}

#[test]
fn storage_info_reports_each_location() {
    let mut store = memory_store();
    store.load_articles();
    store
        .persistent_mut()
        .set_item(BACKUPS[2], "garbage")
        .unwrap();
    store.persistent_mut().remove_item(BACKUPS[1]).unwrap();

    let info = store.storage_info();
    assert_eq!(info.stored_schema.as_deref(), Some("2.0"));
    assert_eq!(info.locations.len(), 5);
    assert_eq!(info.locations[0].location, PRIMARY);
    assert_eq!(info.locations[0].state, LocationState::Articles(2));
    assert_eq!(info.locations[2].state, LocationState::Missing);
    assert!(matches!(info.locations[3].state, LocationState::Unreadable(_)));
    assert_eq!(info.locations[4].location, format!("session:{PRIMARY}"));
    assert!(info.locations[4].bytes > 0);
}

#[test]
fn clear_all_removes_every_managed_key() {
    let mut store = memory_store();
    store.load_articles();

    let report = store.clear_all();
    assert!(report.is_complete());
    assert!(store.persistent().is_empty());
    assert!(store.session().is_empty());

    let reloaded = store.load_articles();
    assert_eq!(reloaded.len(), 2);
    assert!(store
        .persistent()
        .get_item("cw_articles_schema_version")
        .unwrap()
        .is_some());
}
