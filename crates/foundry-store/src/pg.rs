//! Postgres-backed build store.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

use foundry_core::{Build, BuildEventKind};

use crate::error::{StoreError, StoreResult};
use crate::store::{BuildStore, CreateOutcome};

/// Build store over a Postgres connection pool.
///
/// The pool hands each operation a short-lived connection and reclaims it
/// on every exit path, so many in-flight notifications can hit the store
/// without serializing unrelated builds. Uniqueness per `build_key` is
/// enforced by the unique constraint in the schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct BuildRow {
    id: i64,
    build_key: String,
    start_time: DateTime<Utc>,
}

impl From<BuildRow> for Build {
    fn from(row: BuildRow) -> Self {
        Build {
            id: row.id,
            build_key: row.build_key,
            start_time: row.start_time,
        }
    }
}

impl PgStore {
    /// Connect to Postgres and bootstrap the schema.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        debug!(max_connections, "build store connected");
        Ok(store)
    }

    /// Create tables if they don't exist yet and seed the event codes.
    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Schema(e.to_string()))?;
        Ok(())
    }
}

impl BuildStore for PgStore {
    async fn find_build(&self, build_key: &str) -> StoreResult<Option<Build>> {
        let row = sqlx::query_as::<_, BuildRow>(
            "SELECT id, build_key, start_time FROM build WHERE build_key = $1",
        )
        .bind(build_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(Build::from))
    }

    async fn create_build(
        &self,
        build_key: &str,
        start_time: DateTime<Utc>,
    ) -> StoreResult<CreateOutcome> {
        let result = sqlx::query(
            "INSERT INTO build (build_key, start_time) VALUES ($1, $2) \
             ON CONFLICT (build_key) DO NOTHING",
        )
        .bind(build_key)
        .bind(start_time)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            debug!(%build_key, "build already exists");
            Ok(CreateOutcome::AlreadyExists)
        } else {
            debug!(%build_key, "build created");
            Ok(CreateOutcome::Created)
        }
    }

    async fn add_event(
        &self,
        build_id: i64,
        kind: BuildEventKind,
        name: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Resolving the code inside the insert keeps the append a single
        // round trip; zero rows affected means the kind had no code.
        let result = sqlx::query(
            "INSERT INTO build_event (build_id, name, code, time) \
             SELECT $1::bigint, $2::text, code, $3::timestamptz \
             FROM event_code WHERE name = $4",
        )
        .bind(build_id)
        .bind(name)
        .bind(time)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::BuildNotFound(build_id)
            }
            _ => StoreError::Query(e.to_string()),
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownEventType(kind.as_str().to_string()));
        }

        debug!(build_id, %kind, %name, "build event appended");
        Ok(())
    }
}
