//! # sqltag
//!
//! Composable SQL templates with deduplicated `:N` bind placeholders.
//!
//! ## Features
//!
//! - **Values never touch the text**: every interpolated value becomes a `:N` placeholder
//! - **Composition**: queries nest, and `join` / `raw` / `empty` build fragments
//! - **Placeholder reuse**: equal primitive values share one placeholder
//! - **Bulk rows**: array parameters turn one statement into one bind map per row
//! - **Named binds**: `:name` placeholders with direction/type/size for OUT binds
//! - **Bind definitions**: infer driver bind metadata from the rows themselves
//! - **Pool registry**: one self-healing pool per connect string
//!
//! ## Composing queries
//!
//! ```ignore
//! use sqltag::{join, raw, sql};
//!
//! let table = raw("books");
//! let ids = join([1, 2, 3], ", ");
//! let q = sql!("SELECT * FROM {} WHERE id IN ({}) OR parent_id IN ({})", table, ids.clone(), ids)?;
//!
//! assert_eq!(q.render(), "SELECT * FROM books WHERE id IN (:1, :2, :3) OR parent_id IN (:1, :2, :3)");
//! ```
//!
//! ## Bulk inserts
//!
//! ```ignore
//! let q = sql!(
//!     "INSERT INTO books (title, genre) VALUES ({}, {})",
//!     ["Mort", "Sourcery"],
//!     "fantasy",
//! )?;
//!
//! // Two rows, the scalar repeated in both.
//! assert_eq!(q.values()?.row_count(), 2);
//! q.execute(&conn, &ExecuteManyOptions::new().auto_commit(true)).await?;
//! ```

pub mod bind_defs;
pub mod binds;
pub mod client;
pub mod config;
pub mod error;
mod identity;
pub mod prelude;
pub mod sql;
pub mod value;

#[cfg(feature = "tracing")]
pub mod monitor;

#[cfg(feature = "pool")]
pub mod pool;

pub use bind_defs::{BindDef, BindDefs, BindDirection, BindType, to_bind_defs};
pub use binds::{BindKey, BindMap, Binds};
pub use client::{Dispatched, ExecuteManyOptions, ExecuteOptions, Executor};
pub use config::{ComposeConfig, ConnectConfig, EmptyJoinPolicy, PoolConfig};
pub use error::{SqlError, SqlResult};
pub use sql::{IntoRaw, Sql, empty, join, join_with, raw};
pub use value::{Arg, Column, NamedBind, Param, Value};

#[cfg(feature = "tracing")]
pub use monitor::TracingExecutor;

#[cfg(feature = "pool")]
pub use pool::{PoolManager, PoolRegistry};
