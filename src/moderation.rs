//! Moderation state machine for submitted content.
//!
//! Every moderated entity carries a single approval flag: pending → approved
//! or pending → rejected. Rejection clears the flag, which leaves the row
//! indistinguishable from "not yet reviewed". Nothing is hard-deleted here.

use crate::orm::{channels, reviews, tag_suggestions, tags};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Fallback color for tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#0088cc";

/// Set a channel's approval flag. Returns the updated row, or None when the
/// channel does not exist.
pub async fn set_channel_approval(
    db: &DatabaseConnection,
    id: i32,
    approved: bool,
) -> Result<Option<channels::Model>, DbErr> {
    let channel = match channels::Entity::find_by_id(id).one(db).await? {
        Some(channel) => channel,
        None => return Ok(None),
    };

    let mut active: channels::ActiveModel = channel.into();
    active.is_approved = Set(approved);
    Ok(Some(active.update(db).await?))
}

/// Set a review's approval flag. Returns the updated row, or None when the
/// review does not exist.
pub async fn set_review_approval(
    db: &DatabaseConnection,
    id: i32,
    approved: bool,
) -> Result<Option<reviews::Model>, DbErr> {
    let review = match reviews::Entity::find_by_id(id).one(db).await? {
        Some(review) => review,
        None => return Ok(None),
    };

    let mut active: reviews::ActiveModel = review.into();
    active.is_approved = Set(approved);
    Ok(Some(active.update(db).await?))
}

/// Set a tag's approval flag. Returns the updated row, or None when the tag
/// does not exist.
pub async fn set_tag_approval(
    db: &DatabaseConnection,
    id: i32,
    approved: bool,
) -> Result<Option<tags::Model>, DbErr> {
    let tag = match tags::Entity::find_by_id(id).one(db).await? {
        Some(tag) => tag,
        None => return Ok(None),
    };

    let mut active: tags::ActiveModel = tag.into();
    active.is_approved = Set(approved);
    Ok(Some(active.update(db).await?))
}

#[derive(Debug)]
pub enum SuggestionOutcome {
    NotFound,
    AlreadyApproved,
    /// The tag created from the suggestion.
    Approved(tags::Model),
}

/// Convert a pending tag suggestion into a real, approved tag.
///
/// The suggestion row is kept and flagged approved, never deleted. A
/// duplicate tag name fails on the unique constraint and propagates as a
/// database error.
pub async fn approve_suggestion(
    db: &DatabaseConnection,
    id: i32,
) -> Result<SuggestionOutcome, DbErr> {
    let suggestion = match tag_suggestions::Entity::find_by_id(id).one(db).await? {
        Some(suggestion) => suggestion,
        None => return Ok(SuggestionOutcome::NotFound),
    };

    if suggestion.is_approved {
        return Ok(SuggestionOutcome::AlreadyApproved);
    }

    let tag = create_tag(db, &suggestion.name, None).await?;

    let mut active: tag_suggestions::ActiveModel = suggestion.into();
    active.is_approved = Set(true);
    active.update(db).await?;

    Ok(SuggestionOutcome::Approved(tag))
}

/// Create a tag directly. Admin bypass: the tag is born approved.
pub async fn create_tag(
    db: &DatabaseConnection,
    name: &str,
    color: Option<&str>,
) -> Result<tags::Model, DbErr> {
    tags::ActiveModel {
        name: Set(name.trim().to_string()),
        color: Set(Some(normalize_color(color))),
        is_approved: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Accept `#rrggbb`, fall back to the default for anything else.
fn normalize_color(color: Option<&str>) -> String {
    match color {
        Some(c) if c.starts_with('#') && c.len() == 7 => c.to_string(),
        _ => DEFAULT_TAG_COLOR.to_string(),
    }
}
