//! Durable local state: testimonials, blog posts and settings across
//! restarts and between windows sharing one storage directory.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use template_shop_core::{BlogPost, PostId, SettingsSection, Testimonial, TestimonialId};
use template_shop_integration_tests::{FakeBackend, eventually, offline_app, second_window};
use template_shop_storefront::sync::LoadSource;

fn testimonial(name: &str) -> Testimonial {
    Testimonial::new(TestimonialId::new(0), name, 5, "Giao diện đẹp, hỗ trợ nhanh.")
}

#[tokio::test]
async fn test_offline_testimonial_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let app = offline_app(dir.path()).await;
        app.testimonials().ensure_loaded().await;
        let created = app.testimonials().create(testimonial("Hoa")).await.unwrap();
        assert_ne!(created.id, TestimonialId::new(0));
    }

    let app = offline_app(dir.path()).await;
    assert_eq!(app.testimonials().load().await, LoadSource::Persisted);
    assert_eq!(app.testimonials().len(), 4);
    assert!(app.testimonials().items().iter().any(|t| t.name == "Hoa"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_offline_testimonials_all_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let app = offline_app(dir.path()).await;
        app.testimonials().ensure_loaded().await;
        let creates: Vec<_> = (0..12)
            .map(|n| {
                let testimonials = app.testimonials().clone();
                tokio::spawn(async move {
                    testimonials.create(testimonial(&format!("Khách {n}"))).await
                })
            })
            .collect();
        for create in creates {
            assert!(create.await.unwrap().is_some());
        }
        assert_eq!(app.testimonials().len(), 15);
    }

    let app = offline_app(dir.path()).await;
    assert_eq!(app.testimonials().load().await, LoadSource::Persisted);
    assert_eq!(app.testimonials().len(), 15);
}

#[tokio::test]
async fn test_backend_copy_is_mirrored_for_later_outages() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    {
        let app = backend.app(dir.path()).await;
        app.testimonials().ensure_loaded().await;
        app.testimonials().create(testimonial("Minh")).await.unwrap();
        assert_eq!(backend.collection("testimonials").len(), 4);
    }

    backend.set_offline(true);
    let app = backend.app(dir.path()).await;
    assert_eq!(app.testimonials().load().await, LoadSource::Persisted);
    let minh = app
        .testimonials()
        .items()
        .into_iter()
        .find(|t| t.name == "Minh")
        .unwrap();
    assert_eq!(minh.id, TestimonialId::new(1000));
}

#[tokio::test]
async fn test_second_window_follows_testimonial_changes() {
    let dir = tempfile::tempdir().unwrap();
    let first = offline_app(dir.path()).await;
    let second = second_window(&first).await;
    first.testimonials().ensure_loaded().await;
    second.testimonials().ensure_loaded().await;
    assert_eq!(second.testimonials().active().len(), 2);

    first
        .testimonials()
        .toggle_active(TestimonialId::new(3))
        .await
        .unwrap();

    let testimonials = second.testimonials().clone();
    assert!(eventually(|| testimonials.active().len() == 3).await);
}

#[tokio::test]
async fn test_second_window_sees_new_blog_post() {
    let dir = tempfile::tempdir().unwrap();
    let first = offline_app(dir.path()).await;
    let second = second_window(&first).await;
    first.blog().ensure_loaded().await;
    second.blog().ensure_loaded().await;

    let post = BlogPost {
        id: PostId::new(0),
        title: "Chọn template cho cửa hàng đầu tiên".into(),
        slug: String::new(),
        excerpt: String::new(),
        content: "<p>Bắt đầu nhỏ.</p><script>alert(1)</script>".into(),
        author: "Template Shop".into(),
        category: "Hướng dẫn".into(),
        tags: vec!["template".into()],
        date: "2024-02-01".into(),
        image: String::new(),
        published: true,
    };
    let created = first.blog().create(post).await.unwrap();
    assert_eq!(created.slug, "chon-template-cho-cua-hang-dau-tien");

    let blog = second.blog().clone();
    assert!(eventually(|| blog.by_slug(&created.slug).is_some()).await);

    let newest = second.blog().published().into_iter().next().unwrap();
    assert_eq!(newest.slug, created.slug);
    let html = second
        .blog()
        .rendered_content(&created.slug, second.content_policy())
        .unwrap();
    assert!(!html.contains("<script>"));
}

#[tokio::test]
async fn test_settings_save_reset_and_reload() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = backend.app(dir.path()).await;
    app.settings().ensure_loaded().await;

    app.settings()
        .update(SettingsSection::General, "siteName", json!("Cửa hàng Mẫu"))
        .await
        .unwrap();
    assert!(app.settings().save().await);
    assert_eq!(backend.settings()["general"]["siteName"], json!("Cửa hàng Mẫu"));

    assert!(app.settings().reset().await);
    let defaults = template_shop_core::SiteSettings::default();
    assert_eq!(backend.settings()["general"]["siteName"], json!(defaults.general.site_name));

    let other_dir = tempfile::tempdir().unwrap();
    let fresh = backend.app(other_dir.path()).await;
    assert_eq!(fresh.settings().load().await, LoadSource::Remote);
    assert_eq!(fresh.settings().get(), defaults);
}

#[tokio::test]
async fn test_settings_kept_locally_while_backend_is_down() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = backend.app(dir.path()).await;
    app.settings().ensure_loaded().await;

    backend.set_offline(true);
    app.settings()
        .update(SettingsSection::Payments, "shippingFee", json!(45_000))
        .await
        .unwrap();
    assert!(!app.settings().save().await);
    assert!(app.settings().error().is_some());

    let restarted = backend.app(dir.path()).await;
    assert_eq!(restarted.settings().load().await, LoadSource::Persisted);
    assert_eq!(
        restarted.settings().get().payments.shipping_fee,
        rust_decimal::Decimal::from(45_000)
    );
}
