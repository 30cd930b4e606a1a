use cwportal_core::{
    ArticleStatus, KeyValueStorage, ManualClock, MemoryStorage, MigrationOutcome,
    PersistentArticleStore, StoreConfig,
};

fn store_over(persistent: MemoryStorage) -> PersistentArticleStore<MemoryStorage, MemoryStorage> {
    PersistentArticleStore::new(StoreConfig::default(), persistent, MemoryStorage::new())
        .with_clock(ManualClock::ticking())
}

#[test]
fn empty_storage_is_seeded_and_marked() {
    let mut store = store_over(MemoryStorage::new());

    assert_eq!(store.initialize(), Some(MigrationOutcome::Seeded { count: 2 }));
    assert_eq!(
        store
            .persistent()
            .get_item("cw_articles_schema_version")
            .unwrap()
            .as_deref(),
        Some("2.0")
    );
    assert_eq!(store.initialize(), None);
}

#[test]
fn wrapped_legacy_layout_is_normalized_into_current_keys() {
    let mut legacy = MemoryStorage::new();
    legacy.set_item("articles", "[]").unwrap();
    legacy
        .set_item(
            "cms_articles",
            r#"{"version":"1.0","articles":[
                {"id": 1, "title": "Old Post", "content": "<p>x</p>", "status": "draft"},
                {"content": "<p>no title</p>"}
            ]}"#,
        )
        .unwrap();

    let mut store = store_over(legacy);
    assert_eq!(
        store.initialize(),
        Some(MigrationOutcome::Imported {
            source_key: "cms_articles".to_string(),
            count: 2,
        })
    );

    let articles = store.load_articles();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].id, "1");
    assert_eq!(articles[0].slug, "old-post");
    assert_eq!(articles[0].status, ArticleStatus::Draft);
    assert_eq!(articles[0].author, "Admin");
    assert_eq!(articles[0].category, "General");
    assert_eq!(articles[0].version, 1);
    assert_eq!(articles[0].created_at, articles[0].updated_at);
    assert_eq!(articles[1].title, "Untitled Article");
    assert_eq!(articles[1].slug, "untitled-article");
    assert_eq!(articles[1].status, ArticleStatus::Published);
    assert!(!articles[1].id.is_empty());

    for key in ["cw_articles", "cw_articles_backup_1", "cw_articles_backup_3"] {
        assert!(store.persistent().get_item(key).unwrap().is_some(), "{key}");
    }
}

#[test]
fn legacy_sources_are_tried_in_priority_order() {
    let mut legacy = MemoryStorage::new();
    legacy
        .set_item("articles", "this is not json")
        .unwrap();
    legacy
        .set_item("cms_articles", r#"{"articles":[{"title":"From CMS"}]}"#)
        .unwrap();
    legacy
        .set_item("admin_articles", r#"[{"title":"From Admin"}]"#)
        .unwrap();

    let mut store = store_over(legacy);
    let outcome = store.initialize();
    assert!(matches!(
        outcome,
        Some(MigrationOutcome::Imported { ref source_key, count: 1 }) if source_key == "cms_articles"
    ));
    assert_eq!(store.load_articles()[0].title, "From CMS");
}

#[test]
fn marker_prevents_second_migration_across_reopen() {
    let mut store = store_over(MemoryStorage::new());
    store.load_articles();
    store
        .persistent_mut()
        .set_item("admin_articles", r#"[{"title":"Late legacy data"}]"#)
        .unwrap();
    let (persistent, _) = store.into_parts();

    let mut reopened = store_over(persistent);
    assert_eq!(reopened.initialize(), None);
    assert!(reopened
        .load_articles()
        .iter()
        .all(|article| article.title != "Late legacy data"));
}

#[test]
fn lost_marker_keeps_current_primary_data() {
    let mut store = store_over(MemoryStorage::new());
    let kept = store.save_article(cwportal_core::ArticleDraft::titled("Keep across upgrade"));
    store
        .persistent_mut()
        .remove_item("cw_articles_schema_version")
        .unwrap();
    let (persistent, _) = store.into_parts();

    let mut reopened = store_over(persistent);
    assert_eq!(
        reopened.initialize(),
        Some(MigrationOutcome::Imported {
            source_key: "cw_articles".to_string(),
            count: 3,
        })
    );
    assert!(reopened.load_articles().contains(&kept));
}

#[test]
fn outdated_marker_triggers_migration() {
    let mut persistent = MemoryStorage::new();
    persistent
        .set_item("cw_articles_schema_version", "1.0")
        .unwrap();
    persistent
        .set_item("articles", r#"[{"id":"a1","title":"Versioned"}]"#)
        .unwrap();

    let mut store = store_over(persistent);
    assert!(matches!(
        store.initialize(),
        Some(MigrationOutcome::Imported { count: 1, .. })
    ));
    assert_eq!(store.load_articles()[0].id, "a1");
}

#[test]
fn schema_bump_keeps_data_under_configured_primary() {
    let config = StoreConfig::from_json_str(
        r#"{ "keys": {
            "primary": "portal_articles",
            "backups": ["portal_articles_bak"],
            "versionMarker": "portal_schema",
            "session": "portal_articles"
        } }"#,
    )
    .unwrap();
    let mut store = PersistentArticleStore::new(config.clone(), MemoryStorage::new(), MemoryStorage::new())
        .with_clock(ManualClock::ticking());
    let kept = store.save_article(cwportal_core::ArticleDraft::titled("Keep me"));
    let (persistent, _) = store.into_parts();

    let bumped = StoreConfig {
        schema_version: "3.0".to_string(),
        ..config
    };
    let mut reopened = PersistentArticleStore::new(bumped, persistent, MemoryStorage::new())
        .with_clock(ManualClock::ticking());
    assert_eq!(
        reopened.initialize(),
        Some(MigrationOutcome::Imported {
            source_key: "portal_articles".to_string(),
            count: 3,
        })
    );
    assert!(reopened.load_articles().contains(&kept));
    assert_eq!(
        reopened
            .persistent()
            .get_item("portal_schema")
            .unwrap()
            .as_deref(),
        Some("3.0")
    );
}
