//! Blog post store, persisted locally and shared across instances.

use std::cmp::Reverse;

use template_shop_core::{BlogPost, PostId};

use crate::content::{ContentPolicy, slugify};
use crate::fallback;
use crate::storage::keys;
use crate::sync::{Entity, SyncPolicy, SyncStore};

/// Blog store. Every mutation applies locally and is persisted.
pub type BlogStore = SyncStore<BlogPost>;

impl Entity for BlogPost {
    type Id = PostId;

    const NAME: &'static str = "blog post";
    const ENDPOINT: &'static str = "blog";
    const POLICY: SyncPolicy = SyncPolicy::LOCAL_FIRST;
    const PERSIST_KEY: Option<&'static str> = Some(keys::BLOG_POSTS);

    fn id(&self) -> PostId {
        self.id
    }

    fn assign_local_id(&mut self, now_millis: i64) {
        self.id = PostId::new(now_millis);
    }

    fn prepare_for_create(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
    }

    fn bundled() -> Vec<Self> {
        fallback::blog_posts()
    }
}

impl SyncStore<BlogPost> {
    /// Post with the given slug.
    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<BlogPost> {
        self.with_items(|items| items.iter().find(|p| p.slug == slug).cloned())
    }

    /// Posts in `category`.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<BlogPost> {
        self.filter(|p| p.category == category)
    }

    /// Posts carrying `tag` (case-insensitive).
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<BlogPost> {
        self.filter(|p| p.has_tag(tag))
    }

    /// Published posts, newest first.
    #[must_use]
    pub fn published(&self) -> Vec<BlogPost> {
        let mut posts = self.filter(|p| p.published);
        // ISO dates order correctly as strings.
        posts.sort_by_key(|p| Reverse(p.date.clone()));
        posts
    }

    /// Body HTML of the post with `slug`, rendered under `policy`.
    #[must_use]
    pub fn rendered_content(&self, slug: &str, policy: ContentPolicy) -> Option<String> {
        self.with_items(|items| {
            items
                .iter()
                .find(|p| p.slug == slug)
                .map(|p| policy.render(&p.content).into_owned())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::offline_parts;

    async fn offline_store() -> (BlogStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = BlogStore::new(api, storage);
        store.ensure_loaded().await;
        (store, dir)
    }

    fn draft(title: &str) -> BlogPost {
        BlogPost {
            id: PostId::new(0),
            title: title.to_string(),
            slug: String::new(),
            excerpt: String::new(),
            content: "<p>Nội dung</p><script>track()</script>".to_string(),
            author: "Admin".to_string(),
            category: "Tin tức".to_string(),
            tags: vec!["News".to_string()],
            date: "2024-02-01".to_string(),
            image: String::new(),
            published: true,
        }
    }

    #[tokio::test]
    async fn test_published_newest_first() {
        let (store, _dir) = offline_store().await;
        let published = store.published();
        let ids: Vec<i64> = published.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_lookups() {
        let (store, _dir) = offline_store().await;
        assert!(store.by_slug("toi-uu-seo-cho-website-doanh-nghiep").is_some());
        assert_eq!(store.by_tag("TEMPLATE").len(), 2);
        assert_eq!(store.by_category("SEO").len(), 1);
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let (store, _dir) = offline_store().await;
        let created = store.create(draft("Khuyến mãi Tết 2025")).await.unwrap();
        assert_eq!(created.slug, "khuyen-mai-tet-2025");
        assert!(store.by_slug("khuyen-mai-tet-2025").is_some());
        assert_eq!(store.published().first().unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_rendered_content_follows_policy() {
        let (store, _dir) = offline_store().await;
        store.create(draft("Bài viết")).await.unwrap();

        let trusted = store.rendered_content("bai-viet", ContentPolicy::Trusted).unwrap();
        assert!(trusted.contains("<script>"));
        let sanitized = store.rendered_content("bai-viet", ContentPolicy::Sanitized).unwrap();
        assert!(!sanitized.contains("script"));
        assert!(store.rendered_content("missing", ContentPolicy::Trusted).is_none());
    }
}
