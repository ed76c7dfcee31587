//! Blog posts.

use serde::{Deserialize, Serialize};

use super::PostId;

/// A blog post. `content` is HTML; see the storefront content policy for how
/// it is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: PostId,
    pub title: String,
    /// URL slug derived from the title.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Publication date as `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_published")]
    pub published: bool,
}

const fn default_published() -> bool {
    true
}

impl BlogPost {
    /// Case-insensitive tag membership.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
