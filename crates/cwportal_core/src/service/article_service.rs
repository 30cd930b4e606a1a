//! Article use-case service.
//!
//! # Responsibility
//! - Offer the get/save/update/delete/export/import surface admin screens
//!   call, backed by `PersistentArticleStore`.
//!
//! # Invariants
//! - Every call goes through the store's fallback and healing path.
//! - Listing order is the stored order (insertion order).

use crate::model::article::{Article, ArticleDraft, ArticlePatch, ArticleStatus};
use crate::storage::KeyValueStorage;
use crate::store::PersistentArticleStore;

/// Facade over a redundant article store.
pub struct ArticleService<P: KeyValueStorage, S: KeyValueStorage> {
    store: PersistentArticleStore<P, S>,
}

impl<P: KeyValueStorage, S: KeyValueStorage> ArticleService<P, S> {
    pub fn new(store: PersistentArticleStore<P, S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PersistentArticleStore<P, S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PersistentArticleStore<P, S> {
        &mut self.store
    }

    pub fn into_store(self) -> PersistentArticleStore<P, S> {
        self.store
    }

    /// All stored articles.
    pub fn get_articles(&mut self) -> Vec<Article> {
        self.store.load_articles()
    }

    /// Articles with the given status.
    pub fn get_articles_by_status(&mut self, status: ArticleStatus) -> Vec<Article> {
        self.store
            .load_articles()
            .into_iter()
            .filter(|article| article.status == status)
            .collect()
    }

    pub fn published_articles(&mut self) -> Vec<Article> {
        self.store.published_articles()
    }

    pub fn get_article(&mut self, id: &str) -> Option<Article> {
        self.store.get_article(id)
    }

    pub fn get_article_by_slug(&mut self, slug: &str) -> Option<Article> {
        self.store.get_article_by_slug(slug)
    }

    /// Looks up by id first, then by slug.
    pub fn find_article(&mut self, id_or_slug: &str) -> Option<Article> {
        let articles = self.store.load_articles();
        articles
            .iter()
            .find(|article| article.id == id_or_slug)
            .or_else(|| articles.iter().find(|article| article.slug == id_or_slug))
            .cloned()
    }

    pub fn save_article(&mut self, draft: ArticleDraft) -> Article {
        self.store.save_article(draft)
    }

    pub fn update_article(&mut self, id: &str, patch: ArticlePatch) -> Option<Article> {
        self.store.update_article(id, patch)
    }

    pub fn delete_article(&mut self, id: &str) -> bool {
        self.store.delete_article(id)
    }

    pub fn export_articles(&mut self) -> String {
        self.store.export_articles()
    }

    pub fn import_articles(&mut self, json: &str) -> bool {
        self.store.import_articles(json)
    }
}
