//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use teledex::orm::{admin_users, channel_tags, channels, reviews, tag_suggestions, tags};

/// Test admin fixture
pub struct TestAdmin {
    pub id: i32,
    pub username: String,
    pub password: String, // Plain text password for testing
}

/// Create a test admin with known credentials
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestAdmin, DbErr> {
    // Use the same argon2 instance that the login function uses
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = teledex::session::get_argon2()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?
        .to_string();

    let admin = admin_users::ActiveModel {
        username: Set(username.to_string()),
        password: Set(password_hash),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(TestAdmin {
        id: admin.id,
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Create a test channel
pub async fn create_test_channel(
    db: &DatabaseConnection,
    name: &str,
    url: &str,
    approved: bool,
) -> Result<channels::Model, DbErr> {
    channels::ActiveModel {
        name: Set(name.to_string()),
        url: Set(url.to_string()),
        description: Set(None),
        subscriber_count: Set(0),
        is_approved: Set(approved),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a test tag
pub async fn create_test_tag(
    db: &DatabaseConnection,
    name: &str,
    approved: bool,
) -> Result<tags::Model, DbErr> {
    tags::ActiveModel {
        name: Set(name.to_string()),
        color: Set(Some("#0088cc".to_string())),
        is_approved: Set(approved),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Link a tag to a channel
pub async fn tag_channel(
    db: &DatabaseConnection,
    channel_id: i32,
    tag_id: i32,
) -> Result<(), DbErr> {
    channel_tags::ActiveModel {
        channel_id: Set(channel_id),
        tag_id: Set(tag_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Create a test review
pub async fn create_test_review(
    db: &DatabaseConnection,
    channel_id: i32,
    rating: i32,
    approved: bool,
) -> Result<reviews::Model, DbErr> {
    reviews::ActiveModel {
        channel_id: Set(channel_id),
        rating: Set(rating),
        comment: Set(Some("Test review".to_string())),
        is_anonymous: Set(true),
        author_name: Set(None),
        is_approved: Set(approved),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a pending tag suggestion
pub async fn create_test_suggestion(
    db: &DatabaseConnection,
    name: &str,
) -> Result<tag_suggestions::Model, DbErr> {
    tag_suggestions::ActiveModel {
        name: Set(name.to_string()),
        suggested_by: Set(Some("tester".to_string())),
        is_approved: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Get an admin's current failed login attempts count
pub async fn get_failed_attempts(db: &DatabaseConnection, admin_id: i32) -> Result<i32, DbErr> {
    let admin = admin_users::Entity::find_by_id(admin_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Admin not found".to_string()))?;

    Ok(admin.failed_login_attempts)
}

/// Check if an admin account is currently locked
pub async fn is_admin_locked(db: &DatabaseConnection, admin_id: i32) -> Result<bool, DbErr> {
    let admin = admin_users::Entity::find_by_id(admin_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Admin not found".to_string()))?;

    if let Some(locked_until) = admin.locked_until {
        Ok(locked_until > Utc::now().naive_utc())
    } else {
        Ok(false)
    }
}
