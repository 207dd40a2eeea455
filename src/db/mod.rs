mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::StripeClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and collaborators.
///
/// The pool is created in `main` and injected here; nothing in the crate
/// opens connections on its own.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Base URL of this API
    pub base_url: String,
    /// Dashboard frontend URL (login redirects)
    pub app_url: String,
    /// Checkout-session retrieval collaborator; None disables provisioning
    pub stripe: Option<StripeClient>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        // WAL keeps readers unblocked while a booking transaction holds the
        // write lock; busy_timeout makes concurrent IMMEDIATE transactions
        // queue instead of failing with SQLITE_BUSY.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
    });
    Pool::builder().max_size(10).build(manager)
}
