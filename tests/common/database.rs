//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT_SYNC: Once = Once::new();

/// Initialize synchronous global state (SALT, ARGON2, SESSIONS)
fn init_sync_globals() {
    INIT_SYNC.call_once(|| {
        // The argon2 secret must be present before session::init()
        if env::var("SALT").is_err() {
            env::set_var("SALT", "testsaltfortestingonly1234567890AB");
        }

        teledex::session::init();
    });
}

/// Initialize the global pool used by the session and login code paths.
/// Must be called from an async context.
async fn init_global_pool(database_url: &str) {
    static DB_INITIALIZED: AtomicBool = AtomicBool::new(false);

    if !DB_INITIALIZED.swap(true, Ordering::SeqCst) {
        teledex::db::init_db(database_url.to_string()).await;
    }
}

/// Setup test database - initialize globals and return a connection.
///
/// Returns None when TEST_DATABASE_URL is unset so suites skip cleanly on
/// machines without a database. A set-but-unreachable database is a hard
/// failure.
pub async fn setup_test_database() -> Option<DatabaseConnection> {
    let database_url = env::var("TEST_DATABASE_URL").ok()?;

    init_sync_globals();
    init_global_pool(&database_url).await;

    let db = Database::connect(database_url.as_str())
        .await
        .expect("Failed to connect to test database");

    // Note: migrations/schema.sql is assumed to be applied to the test
    // database already.

    Some(db)
}

/// Cleanup function to remove test data
///
/// Truncates all tables that might contain test data. CASCADE removes child
/// records, RESTART IDENTITY resets sequences to 1.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "TRUNCATE TABLE
            sessions,
            channel_tags,
            reviews,
            tag_suggestions,
            channels,
            tags,
            admin_users
        RESTART IDENTITY CASCADE;"
            .to_string(),
    ))
    .await?;

    Ok(())
}
