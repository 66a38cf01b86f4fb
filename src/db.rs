//! Database connection helpers.
//!
//! Wraps the Diesel r2d2 pool used by [`crate::repository::DieselRepository`]
//! and applies the SQLite pragmas every pooled connection needs.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pragmas applied each time a connection is handed out by the pool.
#[derive(Debug, Clone, Copy)]
pub struct SqlitePragmas {
    pub wal: bool,
    pub foreign_keys: bool,
    pub busy_timeout: Duration,
}

impl Default for SqlitePragmas {
    fn default() -> Self {
        Self {
            wal: true,
            foreign_keys: true,
            busy_timeout: Duration::from_secs(30),
        }
    }
}

impl SqlitePragmas {
    fn statements(&self) -> String {
        let mut sql = String::new();
        if self.wal {
            sql.push_str("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; ");
        }
        if self.foreign_keys {
            sql.push_str("PRAGMA foreign_keys = ON; ");
        }
        sql.push_str(&format!(
            "PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ));
        sql
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&self.statements())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a Diesel connection pool for the given database URL.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas::default()))
        .build(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragmas_include_busy_timeout_in_millis() {
        let pragmas = SqlitePragmas {
            wal: false,
            foreign_keys: true,
            busy_timeout: Duration::from_secs(2),
        };
        let sql = pragmas.statements();
        assert!(!sql.contains("journal_mode"));
        assert!(sql.contains("foreign_keys = ON"));
        assert!(sql.ends_with("PRAGMA busy_timeout = 2000;"));
    }
}
