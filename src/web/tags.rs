//! Public tag listing and tag suggestion endpoints.

use crate::db::get_db_pool;
use crate::directory::TagView;
use crate::orm::{tag_suggestions, tags};
use actix_web::{error, get, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ColumnTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_tags).service(submit_suggestion);
}

/// GET /api/tags - approved tags, ordered by name
#[get("/api/tags")]
async fn list_tags() -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let tag_models = tags::Entity::find()
        .filter(tags::Column::IsApproved.eq(true))
        .order_by_asc(tags::Column::Name)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch tags: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;

    let response: Vec<TagView> = tag_models.into_iter().map(TagView::from).collect();

    Ok(HttpResponse::Ok().json(response))
}

/// Tag suggestion as it appears on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub id: i32,
    pub name: String,
    pub suggested_by: Option<String>,
    pub is_approved: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<tag_suggestions::Model> for SuggestionView {
    fn from(suggestion: tag_suggestions::Model) -> Self {
        Self {
            id: suggestion.id,
            name: suggestion.name,
            suggested_by: suggestion.suggested_by,
            is_approved: suggestion.is_approved,
            created_at: suggestion.created_at,
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SuggestionForm {
    #[validate(length(min = 1, max = 50))]
    name: String,
    #[validate(length(max = 50))]
    suggested_by: Option<String>,
}

/// POST /api/tag-suggestions - propose a tag for moderation
#[post("/api/tag-suggestions")]
async fn submit_suggestion(form: web::Json<SuggestionForm>) -> Result<HttpResponse, Error> {
    form.validate().map_err(|e| {
        log::debug!("Tag suggestion validation failed: {}", e);
        error::ErrorBadRequest("Invalid tag suggestion")
    })?;

    let db = get_db_pool();

    let suggestion = tag_suggestions::ActiveModel {
        name: Set(form.name.trim().to_string()),
        suggested_by: Set(form.suggested_by.clone()),
        is_approved: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        log::error!("Failed to create tag suggestion: {}", e);
        error::ErrorInternalServerError("Failed to create tag suggestion")
    })?;

    log::info!(
        "New tag suggested: {} (id: {})",
        suggestion.name,
        suggestion.id
    );

    Ok(HttpResponse::Created().json(SuggestionView::from(suggestion)))
}
