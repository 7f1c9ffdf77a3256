//! Traced Postgres connections.
//!
//! Everything gazette sends to Postgres goes through a [`TracedObject`] or a
//! [`TracedTransaction`] opened on one. Each statement runs inside a
//! `db.statement` debug span recording its kind, the SQL text, the parameter
//! count and, once known, the number of rows returned or affected.

use std::future::Future;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Error, Row, Transaction};
use tracing::Instrument;

/// Run `statement` inside a `db.statement` span. `rows` extracts the row
/// count to record from a successful result.
async fn traced<T>(
    kind: &'static str,
    sql: &str,
    params: usize,
    statement: impl Future<Output = Result<T, Error>>,
    rows: impl FnOnce(&T) -> Option<u64>,
) -> Result<T, Error> {
    let span = tracing::debug_span!(
        "db.statement",
        kind,
        sql = %sql,
        params,
        rows = tracing::field::Empty,
    );
    let out = statement.instrument(span.clone()).await?;
    if let Some(n) = rows(&out) {
        span.record("rows", n);
    }
    Ok(out)
}

/// The connection pool handed to [`crate::PgStore`].
#[derive(Clone, Debug)]
pub struct TracedPool {
    inner: deadpool_postgres::Pool,
}

impl TracedPool {
    pub fn new(pool: deadpool_postgres::Pool) -> Self {
        Self { inner: pool }
    }

    /// Check out a connection. Waits at most the pool's configured timeout.
    pub async fn get(&self) -> Result<TracedObject, deadpool_postgres::PoolError> {
        let conn = self.inner.get().await?;
        Ok(TracedObject { inner: conn })
    }

    pub fn status(&self) -> deadpool_postgres::Status {
        self.inner.status()
    }
}

/// A pooled connection. Returned to the pool on drop.
pub struct TracedObject {
    inner: deadpool_postgres::Object,
}

impl TracedObject {
    fn client(&self) -> &Client {
        &self.inner
    }

    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let statement = self.client().query(sql, params);
        traced("query", sql, params.len(), statement, |rows| Some(rows.len() as u64)).await
    }

    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Error> {
        let statement = self.client().query_opt(sql, params);
        traced("query", sql, params.len(), statement, |row| Some(row.is_some() as u64)).await
    }

    /// For statements that always yield a row, like `RETURNING` upserts.
    pub async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Row, Error> {
        let statement = self.client().query_one(sql, params);
        traced("query", sql, params.len(), statement, |_| Some(1)).await
    }

    /// Returns the number of rows affected.
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, Error> {
        let statement = self.client().execute(sql, params);
        traced("execute", sql, params.len(), statement, |n| Some(*n)).await
    }

    /// Run several `;`-separated statements without parameters.
    pub async fn batch_execute(&self, sql: &str) -> Result<(), Error> {
        traced("batch", sql, 0, self.client().batch_execute(sql), |_| None).await
    }

    /// Open a transaction. It rolls back on drop unless committed.
    pub async fn transaction(&mut self) -> Result<TracedTransaction<'_>, Error> {
        let client: &mut Client = &mut self.inner;
        let inner = traced("begin", "BEGIN", 0, client.transaction(), |_| None).await?;
        Ok(TracedTransaction { inner })
    }
}

/// A transaction on a [`TracedObject`].
pub struct TracedTransaction<'a> {
    inner: Transaction<'a>,
}

impl TracedTransaction<'_> {
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, Error> {
        let statement = self.inner.execute(sql, params);
        traced("execute", sql, params.len(), statement, |n| Some(*n)).await
    }

    pub async fn batch_execute(&self, sql: &str) -> Result<(), Error> {
        traced("batch", sql, 0, self.inner.batch_execute(sql), |_| None).await
    }

    pub async fn commit(self) -> Result<(), Error> {
        traced("commit", "COMMIT", 0, self.inner.commit(), |_| None).await
    }
}
