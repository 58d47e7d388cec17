//! SQLite connection pool and embedded migrations.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to create connection pool: {0}")]
    Pool(#[from] r2d2::PoolError),

    #[error("Failed to run migrations: {0}")]
    Migration(String),
}

/// Per-connection pragmas. SQLite leaves foreign keys off by default, which
/// would disable the cascading deletes on appointments and tokens.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Every connection to `:memory:` opens its own empty database, so an
/// in-memory pool holds exactly one connection and never recycles it.
fn is_in_memory(database_url: &str) -> bool {
    database_url == ":memory:" || database_url.contains("mode=memory")
}

/// Open the pool and bring the schema up to date.
pub fn connect(database_url: &str, max_size: u32) -> Result<DbPool, DbError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let mut builder = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqlitePragmas));
    if is_in_memory(database_url) {
        if max_size > 1 {
            tracing::warn!(requested = max_size, "In-memory database, limiting pool to one connection");
        }
        builder = builder
            .max_size(1)
            .min_idle(None)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = builder.build(manager)?;

    let mut pooled = pool.get()?;
    let conn: &mut SqliteConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::Migration(e.to_string()))?;
    tracing::debug!(count = applied.len(), "Migrations applied");
    drop(pooled);

    Ok(pool)
}
