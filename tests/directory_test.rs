/// Integration tests for the channel directory queries
/// Aggregate math, moderation visibility and search semantics
mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use sea_orm::{entity::*, ActiveValue::Set};
use teledex::directory;
use teledex::orm::channels;

#[actix_rt::test]
#[serial]
async fn test_average_rating_covers_only_approved_reviews() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let channel = create_test_channel(&db, "Tech News", "https://t.me/technews", true)
        .await
        .expect("Failed to create channel");

    create_test_review(&db, channel.id, 5, true)
        .await
        .expect("Failed to create review");
    create_test_review(&db, channel.id, 3, true)
        .await
        .expect("Failed to create review");
    // An unapproved one-star review must not drag the average down
    create_test_review(&db, channel.id, 1, false)
        .await
        .expect("Failed to create review");

    let view = directory::find_channel(&db, channel.id, false)
        .await
        .expect("Failed to fetch channel")
        .expect("Channel not found");

    assert_eq!(view.review_count, 2, "Only approved reviews are counted");
    assert_eq!(
        view.average_rating, 4.0,
        "Average covers approved reviews only"
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_channel_without_reviews_has_zero_average() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let channel = create_test_channel(&db, "Quiet Channel", "https://t.me/quiet", true)
        .await
        .expect("Failed to create channel");

    let view = directory::find_channel(&db, channel.id, false)
        .await
        .expect("Failed to fetch channel")
        .expect("Channel not found");

    assert_eq!(view.review_count, 0);
    assert_eq!(view.average_rating, 0.0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_unapproved_channel_hidden_from_public() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let channel = create_test_channel(&db, "Pending Channel", "https://t.me/pending", false)
        .await
        .expect("Failed to create channel");

    let listed = directory::search_channels(&db, None, &[])
        .await
        .expect("Search failed");
    assert!(listed.is_empty(), "Pending channel must not be listed");

    let public = directory::find_channel(&db, channel.id, false)
        .await
        .expect("Lookup failed");
    assert!(public.is_none(), "Pending channel must not resolve publicly");

    let admin_view = directory::find_channel(&db, channel.id, true)
        .await
        .expect("Lookup failed");
    assert!(admin_view.is_some(), "Admin lookup sees pending channels");

    let all = directory::all_channels(&db).await.expect("Listing failed");
    assert_eq!(all.len(), 1, "Admin listing includes pending channels");
    assert!(!all[0].is_approved);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_search_matches_approved_tag_name() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let channel = create_test_channel(&db, "Daily Brief", "https://t.me/dailybrief", true)
        .await
        .expect("Failed to create channel");
    let tag = create_test_tag(&db, "crypto", true)
        .await
        .expect("Failed to create tag");
    tag_channel(&db, channel.id, tag.id)
        .await
        .expect("Failed to link tag");

    // The needle appears nowhere in the channel itself, only in the tag name
    let results = directory::search_channels(&db, Some("crypto"), &[])
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, channel.id);

    // Case-insensitive
    let results = directory::search_channels(&db, Some("CRYPTO"), &[])
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 1);

    let results = directory::search_channels(&db, Some("nomatch"), &[])
        .await
        .expect("Search failed");
    assert!(results.is_empty());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_search_ignores_unapproved_tag_name() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let channel = create_test_channel(&db, "Daily Brief", "https://t.me/dailybrief", true)
        .await
        .expect("Failed to create channel");
    let tag = create_test_tag(&db, "underground", false)
        .await
        .expect("Failed to create tag");
    tag_channel(&db, channel.id, tag.id)
        .await
        .expect("Failed to link tag");

    let results = directory::search_channels(&db, Some("underground"), &[])
        .await
        .expect("Search failed");
    assert!(
        results.is_empty(),
        "Unapproved tag names must not match searches"
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_search_matches_name_and_description() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let by_name = create_test_channel(&db, "Tech News", "https://t.me/technews", true)
        .await
        .expect("Failed to create channel");

    let by_description = channels::ActiveModel {
        name: Set("Ferris Fan Club".to_string()),
        url: Set("https://t.me/ferris".to_string()),
        description: Set(Some("All about Rust programming".to_string())),
        subscriber_count: Set(0),
        is_approved: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("Failed to create channel");

    let results = directory::search_channels(&db, Some("tech"), &[])
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, by_name.id);

    let results = directory::search_channels(&db, Some("RUST"), &[])
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, by_description.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_tag_filter_restricts_results() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let news = create_test_channel(&db, "News", "https://t.me/news", true)
        .await
        .expect("Failed to create channel");
    let music = create_test_channel(&db, "Music", "https://t.me/music", true)
        .await
        .expect("Failed to create channel");

    let tag_news = create_test_tag(&db, "news", true)
        .await
        .expect("Failed to create tag");
    let tag_music = create_test_tag(&db, "music", true)
        .await
        .expect("Failed to create tag");

    tag_channel(&db, news.id, tag_news.id)
        .await
        .expect("Failed to link tag");
    tag_channel(&db, music.id, tag_music.id)
        .await
        .expect("Failed to link tag");

    let results = directory::search_channels(&db, None, &[tag_news.id])
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, news.id);

    // Any of the given tags qualifies
    let results = directory::search_channels(&db, None, &[tag_news.id, tag_music.id])
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 2);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_listing_orders_by_rating_then_recency() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let low = create_test_channel(&db, "Low", "https://t.me/low", true)
        .await
        .expect("Failed to create channel");
    create_test_review(&db, low.id, 3, true)
        .await
        .expect("Failed to create review");

    // Two five-star channels with distinct creation times
    let older = channels::ActiveModel {
        name: Set("Older Five Star".to_string()),
        url: Set("https://t.me/older5".to_string()),
        description: Set(None),
        subscriber_count: Set(0),
        is_approved: Set(true),
        created_at: Set(Utc::now().naive_utc() - chrono::Duration::hours(2)),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("Failed to create channel");
    create_test_review(&db, older.id, 5, true)
        .await
        .expect("Failed to create review");

    let newer = create_test_channel(&db, "Newer Five Star", "https://t.me/newer5", true)
        .await
        .expect("Failed to create channel");
    create_test_review(&db, newer.id, 5, true)
        .await
        .expect("Failed to create review");

    let results = directory::search_channels(&db, None, &[])
        .await
        .expect("Search failed");

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].id, newer.id,
        "Among equal ratings the newer channel sorts first"
    );
    assert_eq!(results[1].id, older.id);
    assert_eq!(results[2].id, low.id, "Lower rated channel sorts last");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_channel_tag_list_is_unfiltered() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let channel = create_test_channel(&db, "Mixed Tags", "https://t.me/mixed", true)
        .await
        .expect("Failed to create channel");
    let approved = create_test_tag(&db, "approved", true)
        .await
        .expect("Failed to create tag");
    let pending = create_test_tag(&db, "pending", false)
        .await
        .expect("Failed to create tag");
    tag_channel(&db, channel.id, approved.id)
        .await
        .expect("Failed to link tag");
    tag_channel(&db, channel.id, pending.id)
        .await
        .expect("Failed to link tag");

    let view = directory::find_channel(&db, channel.id, false)
        .await
        .expect("Failed to fetch channel")
        .expect("Channel not found");

    assert_eq!(
        view.tags.len(),
        2,
        "The enriched tag list is not filtered by tag approval"
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_site_stats() {
    let db = match setup_test_database().await {
        Some(db) => db,
        None => {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        }
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let approved = create_test_channel(&db, "Approved", "https://t.me/approved", true)
        .await
        .expect("Failed to create channel");
    create_test_channel(&db, "Pending", "https://t.me/pending", false)
        .await
        .expect("Failed to create channel");

    create_test_review(&db, approved.id, 4, true)
        .await
        .expect("Failed to create review");
    create_test_review(&db, approved.id, 2, false)
        .await
        .expect("Failed to create review");

    create_test_tag(&db, "live", true)
        .await
        .expect("Failed to create tag");
    create_test_tag(&db, "queued", false)
        .await
        .expect("Failed to create tag");

    let stats = directory::site_stats(&db).await.expect("Stats failed");

    assert_eq!(stats.total_channels, 2);
    assert_eq!(stats.pending_channels, 1);
    assert_eq!(stats.total_reviews, 2, "Review count covers all reviews");
    assert_eq!(stats.active_tags, 1, "Tag count covers approved tags only");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
