mod group_repository;
mod migrations;
mod models;
mod task_repository;
mod template_repository;

use crate::errors::Error;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use tracing::info;

pub use group_repository::*;
pub use migrations::run_migrations;
pub use models::*;
pub use task_repository::*;
pub use template_repository::*;

pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const IN_MEMORY: &str = ":memory:";

/// Per-connection SQLite settings
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

#[derive(Clone, Debug)]
pub struct Database {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl Database {
    /// Opens (or creates) the database at `db_path` and applies the schema
    ///
    /// `":memory:"` gives a private database backed by a single connection,
    /// since every SQLite in-memory connection would otherwise see its own
    /// empty database.
    pub fn new(db_path: &str) -> Result<Self, Error> {
        let manager = ConnectionManager::<SqliteConnection>::new(db_path);
        let builder = Pool::<ConnectionManager<SqliteConnection>>::builder()
            .connection_customizer(Box::new(SqlitePragmas));
        let builder = if db_path == IN_MEMORY {
            // the single connection is the database; never recycle it
            builder.max_size(1).idle_timeout(None).max_lifetime(None)
        } else {
            builder.max_size(8)
        };
        let pool = builder.build(manager)?;

        let database = Database {
            pool: Arc::new(pool),
        };
        {
            let mut conn = database.get_conn()?;
            run_migrations(&mut conn)?;
        }
        info!("Database ready at {}", db_path);
        Ok(database)
    }

    pub fn in_memory() -> Result<Self, Error> {
        Self::new(IN_MEMORY)
    }

    pub fn get_conn(&self) -> Result<DbConnection, Error> {
        Ok(self.pool.get()?)
    }
}
