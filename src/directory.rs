//! Channel directory queries.
//!
//! The listing queries compute per-channel review aggregates in one grouped
//! statement; the tag list is attached with a follow-up query per row.
//! Aggregates only ever see approved reviews: `review_count` and
//! `average_rating` are 0 for a channel without any.

use crate::app_config;
use crate::orm::{channel_tags, channels, reviews, tags};
use chrono::NaiveDateTime;
use sea_orm::{
    entity::*, query::*, ColumnTrait, DatabaseBackend, DatabaseConnection, DbErr, FromQueryResult,
    QueryFilter, Statement,
};
use serde::Serialize;

const CHANNEL_AGGREGATE_SELECT: &str = r#"
    SELECT
        c.id,
        c.name,
        c.url,
        c.description,
        c.subscriber_count,
        c.is_approved,
        c.created_at,
        CAST(COUNT(DISTINCT r.id) AS BIGINT) AS review_count,
        CAST(COALESCE(AVG(r.rating), 0) AS DOUBLE PRECISION) AS average_rating
    FROM channels c
    LEFT JOIN reviews r ON r.channel_id = c.id AND r.is_approved = TRUE
"#;

#[derive(Debug, FromQueryResult)]
struct ChannelAggregateRow {
    id: i32,
    name: String,
    url: String,
    description: Option<String>,
    subscriber_count: i32,
    is_approved: bool,
    created_at: NaiveDateTime,
    review_count: i64,
    average_rating: f64,
}

/// Tag as it appears on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
    pub is_approved: bool,
    pub created_at: NaiveDateTime,
}

impl From<tags::Model> for TagView {
    fn from(tag: tags::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            is_approved: tag.is_approved,
            created_at: tag.created_at,
        }
    }
}

/// Channel enriched with its tag list and review aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelWithTags {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub subscriber_count: i32,
    pub is_approved: bool,
    pub created_at: NaiveDateTime,
    pub review_count: i64,
    pub average_rating: f64,
    pub tags: Vec<TagView>,
}

/// Public channel search.
///
/// Only approved channels are returned. The needle matches channel name,
/// channel description, or the name of an approved associated tag,
/// case-insensitively. Tag ids restrict to channels linked to at least one
/// of them. Ordered by average rating, then by creation time, both
/// descending.
pub async fn search_channels(
    db: &DatabaseConnection,
    search: Option<&str>,
    tag_ids: &[i32],
) -> Result<Vec<ChannelWithTags>, DbErr> {
    let mut sql = String::from(CHANNEL_AGGREGATE_SELECT);
    sql.push_str(
        r#"
    LEFT JOIN channel_tags ct ON ct.channel_id = c.id
    LEFT JOIN tags t ON t.id = ct.tag_id
    WHERE c.is_approved = TRUE
"#,
    );

    let mut values: Vec<sea_orm::Value> = Vec::new();
    let needle = search.map(str::trim).filter(|s| !s.is_empty());
    if let Some(needle) = needle {
        sql.push_str(
            "    AND (c.name ILIKE $1 OR c.description ILIKE $1 \
             OR (t.name ILIKE $1 AND t.is_approved = TRUE))\n",
        );
        values.push(like_pattern(needle).into());
    }

    if !tag_ids.is_empty() {
        // Ids arrive pre-parsed as integers, so they can be inlined.
        let list = tag_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!("    AND ct.tag_id IN ({})\n", list));
    }

    sql.push_str("    GROUP BY c.id\n");
    sql.push_str("    ORDER BY average_rating DESC, c.created_at DESC\n");
    sql.push_str(&format!(
        "    LIMIT {}",
        app_config::limits().search_results_max
    ));

    let stmt = Statement::from_sql_and_values(DatabaseBackend::Postgres, &sql, values);
    let rows = ChannelAggregateRow::find_by_statement(stmt).all(db).await?;

    with_tags(db, rows).await
}

/// Single channel with aggregates, or None.
///
/// Public callers pass `include_unapproved = false` and never see pending
/// channels; the admin surface passes true.
pub async fn find_channel(
    db: &DatabaseConnection,
    id: i32,
    include_unapproved: bool,
) -> Result<Option<ChannelWithTags>, DbErr> {
    let mut sql = String::from(CHANNEL_AGGREGATE_SELECT);
    sql.push_str("    WHERE c.id = $1\n");
    if !include_unapproved {
        sql.push_str("    AND c.is_approved = TRUE\n");
    }
    sql.push_str("    GROUP BY c.id");

    let stmt = Statement::from_sql_and_values(DatabaseBackend::Postgres, &sql, vec![id.into()]);
    let row = match ChannelAggregateRow::find_by_statement(stmt).one(db).await? {
        Some(row) => row,
        None => return Ok(None),
    };

    let tags = channel_tag_views(db, row.id).await?;
    Ok(Some(into_view(row, tags)))
}

/// Admin listing: every channel regardless of approval, newest first.
pub async fn all_channels(db: &DatabaseConnection) -> Result<Vec<ChannelWithTags>, DbErr> {
    let mut sql = String::from(CHANNEL_AGGREGATE_SELECT);
    sql.push_str("    GROUP BY c.id\n");
    sql.push_str("    ORDER BY c.created_at DESC\n");
    sql.push_str(&format!(
        "    LIMIT {}",
        app_config::limits().admin_listing_max
    ));

    let stmt = Statement::from_string(DatabaseBackend::Postgres, sql);
    let rows = ChannelAggregateRow::find_by_statement(stmt).all(db).await?;

    with_tags(db, rows).await
}

/// Full tag list of a channel, unfiltered by tag approval.
pub async fn channel_tag_views(
    db: &DatabaseConnection,
    channel_id: i32,
) -> Result<Vec<TagView>, DbErr> {
    let rows = channel_tags::Entity::find()
        .filter(channel_tags::Column::ChannelId.eq(channel_id))
        .find_also_related(tags::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(_, tag)| tag)
        .map(TagView::from)
        .collect())
}

async fn with_tags(
    db: &DatabaseConnection,
    rows: Vec<ChannelAggregateRow>,
) -> Result<Vec<ChannelWithTags>, DbErr> {
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = channel_tag_views(db, row.id).await?;
        results.push(into_view(row, tags));
    }
    Ok(results)
}

fn into_view(row: ChannelAggregateRow, tags: Vec<TagView>) -> ChannelWithTags {
    ChannelWithTags {
        id: row.id,
        name: row.name,
        url: row.url,
        description: row.description,
        subscriber_count: row.subscriber_count,
        is_approved: row.is_approved,
        created_at: row.created_at,
        review_count: row.review_count,
        average_rating: round2(row.average_rating),
        tags,
    }
}

/// Site-wide aggregates, recomputed per request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub total_channels: i64,
    pub pending_channels: i64,
    pub total_reviews: i64,
    pub active_tags: i64,
}

pub async fn site_stats(db: &DatabaseConnection) -> Result<SiteStats, DbErr> {
    let total_channels = channels::Entity::find().count(db).await? as i64;
    let pending_channels = channels::Entity::find()
        .filter(channels::Column::IsApproved.eq(false))
        .count(db)
        .await? as i64;
    let total_reviews = reviews::Entity::find().count(db).await? as i64;
    let active_tags = tags::Entity::find()
        .filter(tags::Column::IsApproved.eq(true))
        .count(db)
        .await? as i64;

    Ok(SiteStats {
        total_channels,
        pending_channels,
        total_reviews,
        active_tags,
    })
}

/// Escape LIKE wildcards in a user-supplied needle and wrap it for a
/// contains match. Postgres treats backslash as the default escape char.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{}%", escaped)
}

/// Ratings travel with two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
