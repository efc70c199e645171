//! Execution seam between composed queries and a database driver.
//!
//! sqltag does not talk to a database itself. Drivers implement [`Executor`]
//! and [`Sql::execute`] picks the right entry point for the query's shape.

use crate::bind_defs::{BindDefs, to_bind_defs};
use crate::binds::{BindMap, Binds};
use crate::error::SqlResult;
use crate::sql::Sql;
use std::future::Future;

/// Options for a single-row execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Commit after the statement. `None` leaves the choice to the executor.
    pub auto_commit: Option<bool>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = Some(enabled);
        self
    }
}

/// Options for a bulk execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteManyOptions {
    /// Commit after the batch. `None` leaves the choice to the executor.
    pub auto_commit: Option<bool>,
    /// Bind definitions handed to the driver.
    ///
    /// When executing through [`Sql`], caller entries act as overrides on top
    /// of definitions inferred from the rows.
    pub bind_defs: Option<BindDefs>,
    /// Collect per-row errors instead of aborting the batch.
    pub batch_errors: bool,
}

impl ExecuteManyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = Some(enabled);
        self
    }

    pub fn bind_defs(mut self, defs: BindDefs) -> Self {
        self.bind_defs = Some(defs);
        self
    }

    pub fn batch_errors(mut self, enabled: bool) -> Self {
        self.batch_errors = enabled;
        self
    }

    /// The single-row subset of these options.
    pub fn single(&self) -> ExecuteOptions {
        ExecuteOptions {
            auto_commit: self.auto_commit,
        }
    }
}

/// A database handle able to run rendered SQL with bind maps.
///
/// Implementations typically wrap a driver connection or a transaction.
pub trait Executor: Send + Sync {
    /// Result of a single execution.
    type Output: Send;
    /// Result of a bulk execution.
    type BulkOutput: Send;

    /// Run `sql` once with `binds`.
    fn execute(
        &self,
        sql: &str,
        binds: &BindMap,
        options: &ExecuteOptions,
    ) -> impl Future<Output = SqlResult<Self::Output>> + Send;

    /// Run `sql` once per row in a single round trip.
    fn execute_many(
        &self,
        sql: &str,
        rows: &[BindMap],
        options: &ExecuteManyOptions,
    ) -> impl Future<Output = SqlResult<Self::BulkOutput>> + Send;
}

impl<E: Executor> Executor for &E {
    type Output = E::Output;
    type BulkOutput = E::BulkOutput;

    fn execute(
        &self,
        sql: &str,
        binds: &BindMap,
        options: &ExecuteOptions,
    ) -> impl Future<Output = SqlResult<Self::Output>> + Send {
        (**self).execute(sql, binds, options)
    }

    fn execute_many(
        &self,
        sql: &str,
        rows: &[BindMap],
        options: &ExecuteManyOptions,
    ) -> impl Future<Output = SqlResult<Self::BulkOutput>> + Send {
        (**self).execute_many(sql, rows, options)
    }
}

/// Output of [`Sql::execute`], tagged by the path that ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched<O, B> {
    Single(O),
    Bulk(B),
}

impl<O, B> Dispatched<O, B> {
    pub fn is_bulk(&self) -> bool {
        matches!(self, Dispatched::Bulk(_))
    }

    pub fn single(self) -> Option<O> {
        match self {
            Dispatched::Single(output) => Some(output),
            Dispatched::Bulk(_) => None,
        }
    }

    pub fn bulk(self) -> Option<B> {
        match self {
            Dispatched::Single(_) => None,
            Dispatched::Bulk(output) => Some(output),
        }
    }
}

impl Sql {
    /// Execute this query, choosing the path from the shape of [`Sql::values`].
    ///
    /// A single bind map runs through [`Executor::execute`]. Rows run through
    /// [`Executor::execute_many`] with inferred bind definitions, merged
    /// under any definitions already present in `options`.
    pub async fn execute<E: Executor>(
        &self,
        conn: &E,
        options: &ExecuteManyOptions,
    ) -> SqlResult<Dispatched<E::Output, E::BulkOutput>> {
        match self.values()? {
            Binds::Single(binds) => conn
                .execute(self.render(), binds, &options.single())
                .await
                .map(Dispatched::Single),
            Binds::Rows(rows) => self
                .run_many(conn, rows, options)
                .await
                .map(Dispatched::Bulk),
        }
    }

    /// Execute this query through [`Executor::execute_many`] regardless of
    /// shape. A single bind map becomes one row.
    pub async fn execute_many<E: Executor>(
        &self,
        conn: &E,
        options: &ExecuteManyOptions,
    ) -> SqlResult<E::BulkOutput> {
        let rows = self.values()?.rows();
        self.run_many(conn, rows, options).await
    }

    async fn run_many<E: Executor>(
        &self,
        conn: &E,
        rows: &[BindMap],
        options: &ExecuteManyOptions,
    ) -> SqlResult<E::BulkOutput> {
        let overrides = options.bind_defs.clone().unwrap_or_default();
        let options = ExecuteManyOptions {
            bind_defs: Some(to_bind_defs(rows, overrides)),
            ..options.clone()
        };
        conn.execute_many(self.render(), rows, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_options_keep_auto_commit() {
        let options = ExecuteManyOptions::new().auto_commit(true).batch_errors(true);
        assert_eq!(options.single(), ExecuteOptions::new().auto_commit(true));
        assert_eq!(ExecuteManyOptions::new().single().auto_commit, None);
    }

    #[test]
    fn dispatched_accessors() {
        let single: Dispatched<u8, u16> = Dispatched::Single(1);
        assert!(!single.is_bulk());
        assert_eq!(single.clone().single(), Some(1));
        assert_eq!(single.bulk(), None);

        let bulk: Dispatched<u8, u16> = Dispatched::Bulk(2);
        assert!(bulk.is_bulk());
        assert_eq!(bulk.bulk(), Some(2));
    }
}
