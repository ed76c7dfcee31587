//! Testimonial and blog commands.

use chrono::Local;
use template_shop_core::{BlogPost, PostId, Testimonial, TestimonialId};
use template_shop_storefront::state::AppState;

use super::CommandError;
use crate::output::{print_block, print_lines, warn_if_error};

fn testimonial_line(t: &Testimonial) -> String {
    let stars = "*".repeat(usize::from(t.rating));
    let hidden = if t.is_active { "" } else { " (hidden)" };
    format!("{:>4}  {stars:<5} {:<24} {}{hidden}", t.id, t.name, t.content)
}

pub async fn list_testimonials(state: &AppState, active_only: bool) {
    let testimonials = state.testimonials();
    testimonials.ensure_loaded().await;
    warn_if_error("testimonials", testimonials.error());

    let items = if active_only {
        testimonials.active()
    } else {
        testimonials.items()
    };
    print_lines(&items, "No testimonials", testimonial_line);
    if let Some(average) = testimonials.average_rating() {
        print_block(&format!("Average rating {average:.1}"));
    }
}

pub async fn add_testimonial(
    state: &AppState,
    name: String,
    rating: u8,
    content: String,
    product: String,
) -> Result<(), CommandError> {
    let testimonials = state.testimonials();
    testimonials.ensure_loaded().await;

    let mut testimonial = Testimonial::new(TestimonialId::new(0), name, rating, content);
    testimonial.product = product;
    testimonial.date = Local::now().format("%Y-%m-%d").to_string();

    let created = testimonials
        .create(testimonial)
        .await
        .ok_or_else(|| CommandError::rejected(testimonials.error(), "Testimonial was not saved"))?;
    warn_if_error("testimonials", testimonials.error());
    print_block(&testimonial_line(&created));
    Ok(())
}

pub async fn toggle_testimonial(state: &AppState, id: TestimonialId) -> Result<(), CommandError> {
    let testimonials = state.testimonials();
    testimonials.ensure_loaded().await;
    if testimonials.get_by_id(&id).is_none() {
        return Err(CommandError::not_found("testimonial", id));
    }
    let updated = testimonials
        .toggle_active(id)
        .await
        .ok_or_else(|| CommandError::rejected(testimonials.error(), "Testimonial was not changed"))?;
    warn_if_error("testimonials", testimonials.error());
    print_block(&testimonial_line(&updated));
    Ok(())
}

pub async fn delete_testimonial(state: &AppState, id: TestimonialId) -> Result<(), CommandError> {
    let testimonials = state.testimonials();
    testimonials.ensure_loaded().await;
    if !testimonials.remove(&id).await {
        return Err(CommandError::not_found("testimonial", id));
    }
    warn_if_error("testimonials", testimonials.error());
    print_block(&format!("Deleted testimonial {id}"));
    Ok(())
}

fn post_line(post: &BlogPost) -> String {
    format!(
        "{:>4}  {:<10} {:<44} /blog/{}",
        post.id, post.date, post.title, post.slug
    )
}

pub async fn list_posts(state: &AppState, tag: Option<&str>) {
    let blog = state.blog();
    blog.ensure_loaded().await;
    warn_if_error("blog", blog.error());

    let mut posts = blog.published();
    if let Some(tag) = tag {
        posts.retain(|p| p.has_tag(tag));
    }
    print_lines(&posts, "No posts", post_line);
}

/// Print a post, rendering its HTML under the configured content policy.
pub async fn show_post(state: &AppState, slug: &str) -> Result<(), CommandError> {
    let blog = state.blog();
    blog.ensure_loaded().await;
    warn_if_error("blog", blog.error());

    let post = blog
        .by_slug(slug)
        .ok_or_else(|| CommandError::not_found("post", slug))?;
    let body = blog
        .rendered_content(slug, state.content_policy())
        .unwrap_or_default();
    print_block(&format!(
        "{}\n{} · {} · {}\n\n{}",
        post.title, post.author, post.date, post.category, body
    ));
    Ok(())
}

pub async fn delete_post(state: &AppState, id: PostId) -> Result<(), CommandError> {
    let blog = state.blog();
    blog.ensure_loaded().await;
    if !blog.remove(&id).await {
        return Err(CommandError::not_found("post", id));
    }
    warn_if_error("blog", blog.error());
    print_block(&format!("Deleted post {id}"));
    Ok(())
}
