//! Public channel listing, lookup and submission endpoints.

use crate::db::get_db_pool;
use crate::directory;
use crate::orm::{channel_tags, channels};
use actix_web::{error, get, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_channels)
        .service(view_channel)
        .service(submit_channel);
}

#[derive(Deserialize)]
struct ChannelQuery {
    search: Option<String>,
    /// Comma-separated tag ids, e.g. `tags=1,4,9`
    tags: Option<String>,
}

/// Parse the comma-separated tag filter into ids, dropping anything that is
/// not an integer.
fn parse_tag_ids(raw: Option<&str>) -> Vec<i32> {
    match raw {
        Some(s) if !s.trim().is_empty() => s
            .split(',')
            .filter_map(|part| part.trim().parse::<i32>().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// GET /api/channels - approved channels matching the filters
#[get("/api/channels")]
async fn list_channels(query: web::Query<ChannelQuery>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let tag_ids = parse_tag_ids(query.tags.as_deref());

    let results = directory::search_channels(db, query.search.as_deref(), &tag_ids)
        .await
        .map_err(|e| {
            log::error!("Channel search error: {}", e);
            error::ErrorInternalServerError("Search failed")
        })?;

    Ok(HttpResponse::Ok().json(results))
}

/// GET /api/channels/{id} - single approved channel with tags and aggregates
#[get("/api/channels/{id}")]
async fn view_channel(path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let channel = directory::find_channel(db, path.into_inner(), false)
        .await
        .map_err(|e| {
            log::error!("Channel lookup error: {}", e);
            error::ErrorInternalServerError("Database error")
        })?
        .ok_or_else(|| error::ErrorNotFound("Channel not found"))?;

    Ok(HttpResponse::Ok().json(channel))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ChannelForm {
    #[validate(length(min = 1, max = 100))]
    name: String,
    #[validate(url, length(max = 200))]
    url: String,
    #[validate(length(max = 2000))]
    description: Option<String>,
    #[serde(default)]
    subscriber_count: i32,
    /// Tags to link after creation.
    #[serde(default)]
    tag_ids: Vec<i32>,
}

/// POST /api/channels - submit a channel into the moderation queue
#[post("/api/channels")]
async fn submit_channel(form: web::Json<ChannelForm>) -> Result<HttpResponse, Error> {
    form.validate().map_err(|e| {
        log::debug!("Channel submission validation failed: {}", e);
        error::ErrorBadRequest("Invalid channel data")
    })?;

    let db = get_db_pool();

    // A duplicate url fails the unique constraint here and surfaces as the
    // generic creation error.
    let channel = channels::ActiveModel {
        name: Set(form.name.trim().to_string()),
        url: Set(form.url.trim().to_string()),
        description: Set(form.description.clone()),
        subscriber_count: Set(form.subscriber_count.max(0)),
        is_approved: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        log::error!("Failed to create channel: {}", e);
        error::ErrorInternalServerError("Failed to create channel")
    })?;

    // Dependent second write: a failure here leaves the channel queued
    // without its tags.
    for tag_id in &form.tag_ids {
        channel_tags::ActiveModel {
            channel_id: Set(channel.id),
            tag_id: Set(*tag_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            log::error!("Failed to link tag {} to channel {}: {}", tag_id, channel.id, e);
            error::ErrorInternalServerError("Failed to link tags")
        })?;
    }

    log::info!("New channel submitted: {} (id: {})", channel.name, channel.id);

    let view = directory::find_channel(db, channel.id, true)
        .await
        .map_err(|e| {
            log::error!("Failed to load created channel: {}", e);
            error::ErrorInternalServerError("Database error")
        })?
        .ok_or_else(|| error::ErrorInternalServerError("Database error"))?;

    Ok(HttpResponse::Created().json(view))
}
