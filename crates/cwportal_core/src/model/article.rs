//! Article domain model.
//!
//! # Responsibility
//! - Define the persisted article record and its input shapes.
//! - Derive slugs and excerpts.
//! - Normalize loosely-typed JSON records from older layouts and imports.
//!
//! # Invariants
//! - `id` is stable and never reused for another article.
//! - `version` starts at 1 and grows by one on every update.
//! - `updated_at` is refreshed on every mutation.

use crate::config::RecordDefaults;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

const EXCERPT_MAX_CHARS: usize = 160;
const EMPTY_SLUG: &str = "untitled";

static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Opaque article identifier. Generated ids are UUID v4 text; imported
/// records may carry any non-empty string.
pub type ArticleId = String;

/// Publication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    /// Only the exact string `draft` maps to `Draft`; anything else,
    /// including `"Draft"` or `" draft "`, is published.
    pub fn from_lenient(value: &str) -> Self {
        if value == "draft" {
            Self::Draft
        } else {
            Self::Published
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

/// Persisted article record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    /// HTML body.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub category: String,
    pub status: ArticleStatus,
    pub author: String,
    /// ISO-8601 UTC.
    pub created_at: String,
    /// ISO-8601 UTC.
    pub updated_at: String,
    pub version: u32,
}

/// Input for creating an article. Missing fields take configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub status: Option<ArticleStatus>,
    pub author: Option<String>,
}

impl ArticleDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub status: Option<ArticleStatus>,
    pub author: Option<String>,
}

impl ArticlePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Article {
    /// Builds a fresh record from a draft: new id, slug from title,
    /// `created_at == updated_at == now`, version 1.
    pub fn from_draft(draft: ArticleDraft, defaults: &RecordDefaults, now: &str) -> Self {
        let title = non_empty(draft.title).unwrap_or_else(|| defaults.title.clone());
        let content = draft.content.unwrap_or_default();
        let excerpt = non_empty(draft.excerpt).or_else(|| derive_excerpt(&content));
        Self {
            id: generate_id(),
            slug: slugify(&title),
            title,
            content,
            excerpt,
            category: non_empty(draft.category).unwrap_or_else(|| defaults.category.clone()),
            status: draft.status.unwrap_or(ArticleStatus::Published),
            author: non_empty(draft.author).unwrap_or_else(|| defaults.author.clone()),
            created_at: now.to_string(),
            updated_at: now.to_string(),
            version: 1,
        }
    }

    /// Merges `patch`, bumps `version` and stamps `updated_at`.
    ///
    /// Blank title, slug, category and author values are ignored and a blank
    /// excerpt clears the excerpt, so the result reads back unchanged after
    /// load-time normalization. A changed title without an explicit slug
    /// re-derives the slug.
    pub fn apply_patch(&mut self, patch: ArticlePatch, now: &str) {
        let title = non_empty(patch.title);
        let title_changed = title.as_ref().is_some_and(|title| *title != self.title);

        if let Some(title) = title {
            self.title = title;
        }
        match non_empty(patch.slug) {
            Some(slug) => self.slug = slug,
            None if title_changed => self.slug = slugify(&self.title),
            None => {}
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            self.excerpt = non_empty(Some(excerpt));
        }
        if let Some(category) = non_empty(patch.category) {
            self.category = category;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(author) = non_empty(patch.author) {
            self.author = author;
        }

        self.version = self.version.saturating_add(1);
        self.updated_at = now.to_string();
    }

    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// Generates a new opaque article id.
pub fn generate_id() -> ArticleId {
    Uuid::new_v4().to_string()
}

/// Derives a URL slug: lowercase, runs of non `[a-z0-9]` collapse to `-`,
/// edges trimmed. Empty results become `untitled`.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = SLUG_SEPARATOR_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Plain-text summary of HTML content, or `None` for blank content.
pub fn derive_excerpt(html: &str) -> Option<String> {
    let without_tags = HTML_TAG_RE.replace_all(html, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let collapsed = WHITESPACE_RE.replace_all(decoded.trim(), " ");
    if collapsed.is_empty() {
        return None;
    }

    let mut excerpt = collapsed.chars().take(EXCERPT_MAX_CHARS).collect::<String>();
    if collapsed.chars().count() > EXCERPT_MAX_CHARS {
        excerpt = excerpt.trim_end().to_string();
        excerpt.push_str("...");
    }
    Some(excerpt)
}

/// Normalizes one loosely-typed JSON record.
///
/// Returns `None` when `value` is not a JSON object. Missing or mistyped
/// fields are replaced with defaults; `now` stamps missing timestamps.
pub fn normalize_record(value: &Value, defaults: &RecordDefaults, now: &str) -> Option<Article> {
    let object = value.as_object()?;

    let title = text_field(object, "title").unwrap_or_else(|| defaults.title.clone());
    let slug = text_field(object, "slug").unwrap_or_else(|| slugify(&title));
    let created_at = text_field(object, "createdAt").unwrap_or_else(|| now.to_string());
    let updated_at = text_field(object, "updatedAt").unwrap_or_else(|| created_at.clone());
    let status = object
        .get("status")
        .and_then(Value::as_str)
        .map(ArticleStatus::from_lenient)
        .unwrap_or(ArticleStatus::Published);
    let version = object
        .get("version")
        .and_then(Value::as_u64)
        .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
        .unwrap_or(1)
        .max(1);

    Some(Article {
        id: id_field(object).unwrap_or_else(generate_id),
        title,
        slug,
        content: object
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        excerpt: text_field(object, "excerpt"),
        category: text_field(object, "category").unwrap_or_else(|| defaults.category.clone()),
        status,
        author: text_field(object, "author").unwrap_or_else(|| defaults.author.clone()),
        created_at,
        updated_at,
        version,
    })
}

fn text_field(object: &Map<String, Value>, name: &str) -> Option<String> {
    object
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

// Older layouts stored numeric ids.
fn id_field(object: &Map<String, Value>) -> Option<String> {
    match object.get("id")? {
        Value::String(value) if !value.trim().is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
