//! Admin session management.
//!
//! Sessions are stored server-side in the `sessions` table and mirrored in an
//! in-process map so request authentication does not hit the database on
//! every call. The client only ever holds the opaque UUID token in its
//! signed cookie.

use crate::app_config;
use crate::db::get_db_pool;
use crate::orm::sessions;
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Duration, NaiveDateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sea_orm::{entity::*, query::*, ColumnTrait, DbErr, QueryFilter};
use uuid::Uuid;

/// Cached session record. Mirrors a row of the `sessions` table.
#[derive(Copy, Clone, Debug)]
pub struct Record {
    pub admin_id: i32,
    pub expires_at: NaiveDateTime,
}

pub type SessionMap = DashMap<Uuid, Record>;

static SALT: OnceCell<String> = OnceCell::new();
static ARGON2: OnceCell<Argon2<'static>> = OnceCell::new();
static SESSIONS: OnceCell<SessionMap> = OnceCell::new();

/// Initialize the password hasher and the session cache.
/// Panics
pub fn init() {
    if SESSIONS.get().is_some() {
        return;
    }

    let salt = std::env::var("SALT")
        .expect("SALT must be set. It is the secret key for password hashing.");
    SALT.set(salt).expect("SALT was initialized twice.");

    let argon2 = Argon2::new_with_secret(
        SALT.get().unwrap().as_bytes(),
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )
    .expect("Argon2 failed to initialize. Is SALT shorter than 8 bytes?");
    if ARGON2.set(argon2).is_err() {
        panic!("ARGON2 was initialized twice.");
    }

    SESSIONS
        .set(DashMap::new())
        .expect("SESSIONS was initialized twice.");
}

pub fn get_argon2() -> &'static Argon2<'static> {
    ARGON2.get().expect("Argon2 is not initialized.")
}

pub fn get_sess() -> &'static SessionMap {
    SESSIONS.get().expect("Session cache is not initialized.")
}

/// Create a session for an admin and persist it.
pub async fn new_session(ses_map: &SessionMap, admin_id: i32) -> Result<Uuid, DbErr> {
    let db = get_db_pool();
    let uuid = Uuid::new_v4();
    let timeout = app_config::security().session_timeout_minutes;
    let expires_at = Utc::now().naive_utc() + Duration::minutes(timeout as i64);

    sessions::ActiveModel {
        id: Set(uuid),
        admin_id: Set(admin_id),
        expires_at: Set(expires_at),
    }
    .insert(db)
    .await?;

    ses_map.insert(
        uuid,
        Record {
            admin_id,
            expires_at,
        },
    );

    Ok(uuid)
}

/// Delete a session from the database and the cache.
pub async fn remove_session(ses_map: &SessionMap, uuid: Uuid) -> Result<(), DbErr> {
    let db = get_db_pool();

    sessions::Entity::delete_many()
        .filter(sessions::Column::Id.eq(uuid))
        .exec(db)
        .await?;
    ses_map.remove(&uuid);

    Ok(())
}

/// Resolve a session token. Expired records are evicted, not returned.
pub async fn authenticate_by_uuid(ses_map: &SessionMap, uuid: Uuid) -> Option<Record> {
    let now = Utc::now().naive_utc();

    if let Some(record) = ses_map.get(&uuid).map(|r| *r.value()) {
        if record.expires_at > now {
            return Some(record);
        }
        ses_map.remove(&uuid);
        return None;
    }

    // Cache miss. The session may have been created by a previous process.
    let db = get_db_pool();
    let row = match sessions::Entity::find()
        .filter(sessions::Column::Id.eq(uuid))
        .one(db)
        .await
    {
        Ok(row) => row?,
        Err(e) => {
            log::error!("authenticate_by_uuid: {}", e);
            return None;
        }
    };

    if row.expires_at <= now {
        return None;
    }

    let record = Record {
        admin_id: row.admin_id,
        expires_at: row.expires_at,
    };
    ses_map.insert(uuid, record);
    Some(record)
}

/// Resolve the `token` cookie from the actix session jar to a session record.
pub async fn authenticate_by_cookie(cookies: &actix_session::Session) -> Option<(Uuid, Record)> {
    let token = match cookies.get::<String>("token") {
        Ok(Some(token)) => token,
        Ok(None) => return None,
        Err(e) => {
            log::error!("authenticate_by_cookie: cookies.get() {}", e);
            return None;
        }
    };

    let uuid = match Uuid::parse_str(&token) {
        Ok(uuid) => uuid,
        Err(e) => {
            log::debug!("authenticate_by_cookie: parse_str() {}", e);
            return None;
        }
    };

    authenticate_by_uuid(get_sess(), uuid)
        .await
        .map(|record| (uuid, record))
}

/// Delete expired sessions from the database and the cache.
/// Returns the number of database rows removed.
pub async fn expire_sessions(ses_map: &SessionMap) -> Result<u64, DbErr> {
    let db = get_db_pool();
    let now = Utc::now().naive_utc();

    let result = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;

    ses_map.retain(|_, record| record.expires_at > now);

    Ok(result.rows_affected)
}
