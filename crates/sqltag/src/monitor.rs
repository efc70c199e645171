//! `tracing` instrumentation for executors.
//!
//! Enable via the crate feature: `sqltag = { features = ["tracing"] }` (on by
//! default).

use crate::binds::BindMap;
use crate::client::{ExecuteManyOptions, ExecuteOptions, Executor};
use crate::error::SqlResult;
use std::future::Future;
use std::time::Instant;
use tracing::Level;

/// Truncate a string to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// An [`Executor`] wrapper that emits one `tracing` event per statement.
///
/// Events use target `sqltag.sql`. Successful statements are logged at
/// [`level`](Self::level); failures always at `WARN` with the error attached.
///
/// ```ignore
/// let conn = TracingExecutor::new(driver).level(Level::INFO);
/// sql!("DELETE FROM books WHERE id = {}", 7)?.execute(&conn, &Default::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TracingExecutor<E> {
    inner: E,
    /// Tracing event level for successful statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl<E> TracingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn emit<T>(
        &self,
        kind: &'static str,
        sql: &str,
        rows: usize,
        bind_count: usize,
        started: Instant,
        result: &SqlResult<T>,
    ) {
        let sql = self.truncate_sql(sql);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(_) => emit_at_level!(
                self.level,
                target: "sqltag.sql",
                kind,
                rows,
                bind_count,
                elapsed_ms,
                sql = %sql,
            ),
            Err(err) => tracing::warn!(
                target: "sqltag.sql",
                kind,
                rows,
                bind_count,
                elapsed_ms,
                sql = %sql,
                error = %err,
                "statement failed"
            ),
        }
    }
}

impl<E: Executor> Executor for TracingExecutor<E> {
    type Output = E::Output;
    type BulkOutput = E::BulkOutput;

    fn execute(
        &self,
        sql: &str,
        binds: &BindMap,
        options: &ExecuteOptions,
    ) -> impl Future<Output = SqlResult<Self::Output>> + Send {
        async move {
            let started = Instant::now();
            let result = self.inner.execute(sql, binds, options).await;
            self.emit("execute", sql, 1, binds.len(), started, &result);
            result
        }
    }

    fn execute_many(
        &self,
        sql: &str,
        rows: &[BindMap],
        options: &ExecuteManyOptions,
    ) -> impl Future<Output = SqlResult<Self::BulkOutput>> + Send {
        async move {
            let started = Instant::now();
            let result = self.inner.execute_many(sql, rows, options).await;
            let bind_count = rows.first().map_or(0, BindMap::len);
            self.emit("execute_many", sql, rows.len(), bind_count, started, &result);
            result
        }
    }
}
