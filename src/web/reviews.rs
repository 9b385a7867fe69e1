//! Public review listing and submission endpoints.

use crate::db::get_db_pool;
use crate::orm::{channels, reviews};
use actix_web::{error, get, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ColumnTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_reviews).service(submit_review);
}

/// Review as it appears on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: i32,
    pub channel_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub is_anonymous: bool,
    pub author_name: Option<String>,
    pub is_approved: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<reviews::Model> for ReviewView {
    fn from(review: reviews::Model) -> Self {
        Self {
            id: review.id,
            channel_id: review.channel_id,
            rating: review.rating,
            comment: review.comment,
            is_anonymous: review.is_anonymous,
            author_name: review.author_name,
            is_approved: review.is_approved,
            created_at: review.created_at,
        }
    }
}

/// A signed review must carry a non-empty author name.
fn valid_author(is_anonymous: bool, author_name: Option<&str>) -> bool {
    is_anonymous || author_name.map(|n| !n.trim().is_empty()).unwrap_or(false)
}

/// GET /api/channels/{id}/reviews - approved reviews, newest first
#[get("/api/channels/{id}/reviews")]
async fn list_reviews(path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let channel_id = path.into_inner();

    let channel = channels::Entity::find_by_id(channel_id)
        .one(db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch channel: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;
    if channel.is_none() {
        return Err(error::ErrorNotFound("Channel not found"));
    }

    let review_models = reviews::Entity::find()
        .filter(reviews::Column::ChannelId.eq(channel_id))
        .filter(reviews::Column::IsApproved.eq(true))
        .order_by_desc(reviews::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;

    let response: Vec<ReviewView> = review_models.into_iter().map(ReviewView::from).collect();

    Ok(HttpResponse::Ok().json(response))
}

fn default_anonymous() -> bool {
    true
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ReviewForm {
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    #[validate(length(max = 2000))]
    comment: Option<String>,
    #[serde(default = "default_anonymous")]
    is_anonymous: bool,
    #[validate(length(max = 50))]
    author_name: Option<String>,
}

/// POST /api/channels/{id}/reviews - submit a review into the moderation queue
#[post("/api/channels/{id}/reviews")]
async fn submit_review(
    path: web::Path<i32>,
    form: web::Json<ReviewForm>,
) -> Result<HttpResponse, Error> {
    form.validate().map_err(|e| {
        log::debug!("Review submission validation failed: {}", e);
        error::ErrorBadRequest("Invalid review data")
    })?;

    if !valid_author(form.is_anonymous, form.author_name.as_deref()) {
        return Err(error::ErrorBadRequest(
            "Author name is required for signed reviews",
        ));
    }

    let db = get_db_pool();
    let channel_id = path.into_inner();

    let channel = channels::Entity::find_by_id(channel_id)
        .one(db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch channel: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;
    if channel.is_none() {
        return Err(error::ErrorNotFound("Channel not found"));
    }

    let author_name = if form.is_anonymous {
        None
    } else {
        form.author_name.as_deref().map(|n| n.trim().to_string())
    };

    let review = reviews::ActiveModel {
        channel_id: Set(channel_id),
        rating: Set(form.rating),
        comment: Set(form.comment.clone()),
        is_anonymous: Set(form.is_anonymous),
        author_name: Set(author_name),
        is_approved: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        log::error!("Failed to create review: {}", e);
        error::ErrorInternalServerError("Failed to create review")
    })?;

    log::info!(
        "New review submitted for channel {} (review id: {})",
        channel_id,
        review.id
    );

    Ok(HttpResponse::Created().json(ReviewView::from(review)))
}
