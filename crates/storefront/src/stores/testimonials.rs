//! Testimonial store, persisted locally and shared across instances.

use serde_json::json;
use template_shop_core::{Testimonial, TestimonialId};

use crate::fallback;
use crate::storage::keys;
use crate::sync::{Entity, SyncPolicy, SyncStore};

/// Testimonial store. Every mutation applies locally and is persisted.
pub type TestimonialStore = SyncStore<Testimonial>;

impl Entity for Testimonial {
    type Id = TestimonialId;

    const NAME: &'static str = "testimonial";
    const ENDPOINT: &'static str = "testimonials";
    const POLICY: SyncPolicy = SyncPolicy::LOCAL_FIRST;
    const PERSIST_KEY: Option<&'static str> = Some(keys::TESTIMONIALS);

    fn id(&self) -> TestimonialId {
        self.id
    }

    fn assign_local_id(&mut self, now_millis: i64) {
        self.id = TestimonialId::new(now_millis);
    }

    fn prepare_for_create(&mut self) {
        self.rating = self.rating.clamp(Testimonial::MIN_RATING, Testimonial::MAX_RATING);
    }

    fn bundled() -> Vec<Self> {
        fallback::testimonials()
    }
}

impl SyncStore<Testimonial> {
    /// Testimonials shown publicly.
    #[must_use]
    pub fn active(&self) -> Vec<Testimonial> {
        self.filter(|t| t.is_active)
    }

    /// Flip a testimonial's visibility.
    pub async fn toggle_active(&self, id: TestimonialId) -> Option<Testimonial> {
        let current = self.get_by_id(&id)?;
        self.update(&id, json!({ "isActive": !current.is_active }))
            .await
    }

    /// Mean rating over active testimonials, `None` when there are none.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        let ratings: Vec<u8> = self.with_items(|items| {
            items
                .iter()
                .filter(|t| t.is_active)
                .map(|t| t.rating)
                .collect()
        });
        if ratings.is_empty() {
            return None;
        }
        let sum: f64 = ratings.iter().copied().map(f64::from).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = ratings.len() as f64;
        Some(sum / count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sync::LoadSource;
    use crate::test_support::offline_parts;

    #[tokio::test]
    async fn test_active_and_average() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = TestimonialStore::new(api, storage);
        store.ensure_loaded().await;

        assert_eq!(store.active().len(), 2);
        assert!((store.average_rating().unwrap() - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_toggle_applies_locally_when_offline() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = TestimonialStore::new(api, storage);
        store.ensure_loaded().await;

        let toggled = store.toggle_active(TestimonialId::new(3)).await.unwrap();
        assert!(toggled.is_active);
        assert_eq!(store.active().len(), 3);
        assert!(store.toggle_active(TestimonialId::new(42)).await.is_none());
    }

    #[tokio::test]
    async fn test_added_testimonial_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let created = {
            let (api, storage) = offline_parts(dir.path()).await;
            let store = TestimonialStore::new(api, storage);
            store
                .create(Testimonial::new(TestimonialId::new(0), "Khách mới", 9, "Tuyệt vời"))
                .await
                .unwrap()
        };
        assert_eq!(created.rating, 5);

        let (api, storage) = offline_parts(dir.path()).await;
        let reopened = TestimonialStore::new(api, storage);
        assert_eq!(reopened.load().await, LoadSource::Persisted);
        assert_eq!(reopened.len(), 4);
        assert_eq!(reopened.get_by_id(&created.id).unwrap().name, "Khách mới");
    }
}
