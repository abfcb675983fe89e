//! # Postgres State Store
//!
//! Durable state backend over sqlx. One row per message id; merge-upsert
//! via `ON CONFLICT ... COALESCE` so later lifecycle writes never erase
//! fields an earlier hook recorded. TTL is an `expires_at` column every
//! query compares against `now()`, and bulk deletion is supported because
//! a single `DELETE` is transactional here.

use crate::error::{CourierError, Result};
use crate::state::filter::StateFilter;
use crate::state::store::StateStore;
use crate::state::{State, StateStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS courier_states (
    message_id        TEXT PRIMARY KEY,
    status            TEXT NOT NULL,
    actor_name        TEXT NOT NULL,
    args              JSONB NOT NULL DEFAULT '[]'::jsonb,
    kwargs            JSONB NOT NULL DEFAULT '{}'::jsonb,
    options           JSONB NOT NULL DEFAULT '{}'::jsonb,
    priority          INTEGER,
    group_id          TEXT,
    enqueued_datetime TIMESTAMPTZ,
    started_datetime  TIMESTAMPTZ,
    end_datetime      TIMESTAMPTZ,
    expires_at        TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_GROUP_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS courier_states_group_id_idx
    ON courier_states (group_id) WHERE group_id IS NOT NULL
"#;

const CREATE_EXPIRY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS courier_states_expires_at_idx
    ON courier_states (expires_at)
"#;

const UPSERT_STATE: &str = r#"
INSERT INTO courier_states (
    message_id, status, actor_name, args, kwargs, options,
    priority, group_id, enqueued_datetime, started_datetime, end_datetime,
    expires_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now() + make_interval(secs => $12))
ON CONFLICT (message_id) DO UPDATE SET
    status            = EXCLUDED.status,
    actor_name        = EXCLUDED.actor_name,
    args              = EXCLUDED.args,
    kwargs            = EXCLUDED.kwargs,
    options           = EXCLUDED.options,
    priority          = COALESCE(EXCLUDED.priority, courier_states.priority),
    group_id          = COALESCE(EXCLUDED.group_id, courier_states.group_id),
    enqueued_datetime = COALESCE(EXCLUDED.enqueued_datetime, courier_states.enqueued_datetime),
    started_datetime  = COALESCE(EXCLUDED.started_datetime, courier_states.started_datetime),
    end_datetime      = COALESCE(EXCLUDED.end_datetime, courier_states.end_datetime),
    expires_at        = EXCLUDED.expires_at
"#;

const SELECT_COLUMNS: &str = r#"
SELECT message_id, status, actor_name, args, kwargs, options,
       priority, group_id, enqueued_datetime, started_datetime, end_datetime
FROM courier_states
"#;

/// Durable, shared state store over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PostgresStateStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct StateRow {
    message_id: String,
    status: String,
    actor_name: String,
    args: Value,
    kwargs: Value,
    options: Value,
    priority: Option<i32>,
    group_id: Option<String>,
    enqueued_datetime: Option<DateTime<Utc>>,
    started_datetime: Option<DateTime<Utc>>,
    end_datetime: Option<DateTime<Utc>>,
}

impl TryFrom<StateRow> for State {
    type Error = CourierError;

    fn try_from(row: StateRow) -> Result<Self> {
        let status: StateStatus = row
            .status
            .parse()
            .map_err(|e: String| CourierError::Database(e))?;
        let args = match row.args {
            Value::Array(values) => values,
            other => vec![other],
        };
        let kwargs = match row.kwargs {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        let options = match row.options {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        Ok(State {
            message_id: row.message_id,
            status,
            actor_name: row.actor_name,
            args,
            kwargs,
            options,
            priority: row.priority,
            group_id: row.group_id,
            enqueued_datetime: row.enqueued_datetime,
            started_datetime: row.started_datetime,
            end_datetime: row.end_datetime,
        })
    }
}

impl PostgresStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small dedicated pool and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the `courier_states` table and its indexes. Idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_GROUP_INDEX).execute(&self.pool).await?;
        sqlx::query(CREATE_EXPIRY_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Append the non-pagination filter conditions. The haystack mirrors
    /// the in-memory matcher: actor name, args and kwargs joined by NUL,
    /// with empty collections excluded.
    fn push_conditions<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a StateFilter) {
        builder.push(" WHERE expires_at > now()");
        if filter.get_groups {
            builder.push(" AND group_id IS NOT NULL");
        }
        if let Some(needle) = &filter.search_value {
            builder.push(
                " AND lower(concat_ws(chr(0), actor_name, \
                 nullif(args::text, '[]'), nullif(kwargs::text, '{}'))) LIKE ",
            );
            builder.push_bind(format!("%{}%", needle.to_lowercase()));
        }
    }
}

#[async_trait]
impl StateStore for PostgresStateStore {
    async fn set_state(&self, state: State, ttl_seconds: i64) -> Result<()> {
        sqlx::query(UPSERT_STATE)
            .bind(&state.message_id)
            .bind(state.status.to_string())
            .bind(&state.actor_name)
            .bind(Value::Array(state.args.clone()))
            .bind(Value::Object(state.kwargs.clone()))
            .bind(Value::Object(state.options.clone()))
            .bind(state.priority)
            .bind(&state.group_id)
            .bind(state.enqueued_datetime)
            .bind(state.started_datetime)
            .bind(state.end_datetime)
            .bind(ttl_seconds as f64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_state(&self, message_id: &str) -> Result<Option<State>> {
        let sql = format!("{SELECT_COLUMNS} WHERE message_id = $1 AND expires_at > now()");
        let row: Option<StateRow> = sqlx::query_as(&sql)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(State::try_from).transpose()
    }

    async fn get_states(&self, filter: &StateFilter) -> Result<Vec<State>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        Self::push_conditions(&mut builder, filter);
        builder.push(" ORDER BY enqueued_datetime DESC NULLS LAST, message_id ASC");
        if let Some(size) = filter.size {
            builder.push(" LIMIT ");
            builder.push_bind(size as i64);
        }
        if filter.offset > 0 {
            builder.push(" OFFSET ");
            builder.push_bind(filter.offset as i64);
        }

        let rows: Vec<StateRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(State::try_from).collect()
    }

    async fn count_states(&self, filter: &StateFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT count(*) FROM courier_states");
        Self::push_conditions(&mut builder, filter);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    fn supports_clean(&self) -> bool {
        true
    }

    async fn clean(&self, filter: &StateFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM courier_states");
        Self::push_conditions(&mut builder, filter);
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
