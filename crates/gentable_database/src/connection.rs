//! Postgres connection pooling and migration bootstrap.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use gentable_error::{DatabaseError, DatabaseErrorKind};

/// Migrations embedded in the binary at compile time, applied by
/// [`run_migrations`].
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// A pooled connection handle, shared across the process.
pub type ConnectionPool = Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool from the `DATABASE_URL` environment variable.
pub fn establish_pool() -> Result<ConnectionPool, DatabaseError> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| DatabaseError::new(DatabaseErrorKind::Connection("DATABASE_URL environment variable not set".to_string())))?;
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .map_err(|err| DatabaseError::new(DatabaseErrorKind::Connection(err.to_string())))
}

/// Apply every pending migration against `pool`'s database.
pub fn run_migrations(pool: &ConnectionPool) -> Result<(), DatabaseError> {
    let mut conn = pool.get().map_err(|err| DatabaseError::new(DatabaseErrorKind::Connection(err.to_string())))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|err| DatabaseError::new(DatabaseErrorKind::Migration(err.to_string())))
}
