//! Seed content written when no stored or legacy articles exist.

use crate::config::RecordDefaults;
use crate::model::article::{derive_excerpt, Article, ArticleStatus};

struct Sample {
    id: &'static str,
    title: &'static str,
    slug: &'static str,
    category: &'static str,
    content: &'static str,
}

const SAMPLES: [Sample; 2] = [
    Sample {
        id: "sample-1",
        title: "Getting Started with Contingent Workforce Management",
        slug: "getting-started-with-contingent-workforce-management",
        category: "Best Practices",
        content: "<h2>Why it matters</h2><p>Contractors, freelancers and agency workers now make up a large share of many workforces. A clear operating model keeps engagement compliant and cost-effective.</p><ul><li>Map every non-employee engagement</li><li>Assign an owner for each supplier</li><li>Review classification rules yearly</li></ul>",
    },
    Sample {
        id: "sample-2",
        title: "Worker Classification Risks by Country",
        slug: "worker-classification-risks-by-country",
        category: "Compliance",
        content: "<h2>Misclassification</h2><p>Rules for distinguishing contractors from employees differ by country. Penalties can include back taxes, social contributions and fines.</p><p>Check the country guides before engaging talent abroad.</p>",
    },
];

/// Returns the two built-in sample articles stamped with `now`.
pub fn sample_articles(defaults: &RecordDefaults, now: &str) -> Vec<Article> {
    SAMPLES
        .iter()
        .map(|sample| Article {
            id: sample.id.to_string(),
            title: sample.title.to_string(),
            slug: sample.slug.to_string(),
            content: sample.content.to_string(),
            excerpt: derive_excerpt(sample.content),
            category: sample.category.to_string(),
            status: ArticleStatus::Published,
            author: defaults.author.clone(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
            version: 1,
        })
        .collect()
}
