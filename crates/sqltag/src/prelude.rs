//! Convenient imports for typical `sqltag` usage.
//!
//! ```ignore
//! use sqltag::prelude::*;
//! ```

pub use crate::{
    Binds, Column, ExecuteManyOptions, ExecuteOptions, Executor, NamedBind, Sql, SqlError,
    SqlResult, Value, empty, join, raw, sql,
};

#[cfg(feature = "pool")]
pub use crate::{ConnectConfig, PoolConfig, PoolManager, PoolRegistry};
