//! Admin account provisioning.

use crate::db::get_db_pool;
use crate::orm::admin_users;
use crate::session::get_argon2;
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    PasswordHasher,
};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DbErr};

/// Hash a password with the process-wide argon2 instance.
pub fn hash_password(pass: &str) -> Result<String, argon2::password_hash::Error> {
    get_argon2()
        .hash_password(pass.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
}

pub async fn insert_new_admin(name: &str, password_hash: &str) -> Result<admin_users::Model, DbErr> {
    let db = get_db_pool();

    admin_users::ActiveModel {
        username: Set(name.to_owned()),
        password: Set(password_hash.to_owned()),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create the first admin account from ADMIN_USERNAME / ADMIN_PASSWORD when
/// no admin exists yet. The password is hashed, never stored as given.
pub async fn ensure_default_admin() -> Result<(), DbErr> {
    let db = get_db_pool();

    let existing = admin_users::Entity::find().count(db).await?;
    if existing > 0 {
        log::debug!("Admin account already present, skipping bootstrap");
        return Ok(());
    }

    let (name, pass) = match (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        (Ok(name), Ok(pass)) if !name.is_empty() && !pass.is_empty() => (name, pass),
        _ => {
            log::warn!(
                "No admin account exists and ADMIN_USERNAME/ADMIN_PASSWORD are unset. \
                 Moderation endpoints will be unusable until an admin is provisioned."
            );
            return Ok(());
        }
    };

    let password_hash = hash_password(&pass)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let admin = insert_new_admin(&name, &password_hash).await?;
    log::info!("Default admin account created: {} (id: {})", name, admin.id);

    Ok(())
}
