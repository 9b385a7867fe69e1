//! Global database connection pool.

use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect to the database and store the pool for the lifetime of the process.
/// Panics
pub async fn init_db(database_url: String) {
    let opt = ConnectOptions::new(database_url);
    let pool = Database::connect(opt)
        .await
        .expect("Failed to connect to database.");
    DB_POOL
        .set(pool)
        .expect("init_db() called more than once.");
}

pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("Database pool is not initialized.")
}
