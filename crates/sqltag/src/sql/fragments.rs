//! Fragment constructors: `raw`, `empty`, `join`.

use super::Sql;
use crate::config::EmptyJoinPolicy;
use crate::error::{SqlError, SqlResult};
use crate::value::Arg;

/// Things that can be inserted verbatim into SQL text.
///
/// Implemented for strings and numbers (never bound, copied into the text)
/// and for [`Sql`] itself (returned unchanged).
pub trait IntoRaw {
    fn into_raw(self) -> Sql;
}

impl IntoRaw for Sql {
    fn into_raw(self) -> Sql {
        self
    }
}

impl IntoRaw for &Sql {
    fn into_raw(self) -> Sql {
        self.clone()
    }
}

impl IntoRaw for String {
    fn into_raw(self) -> Sql {
        Sql::from_text(self)
    }
}

impl IntoRaw for &str {
    fn into_raw(self) -> Sql {
        Sql::from_text(self.to_string())
    }
}

impl IntoRaw for &String {
    fn into_raw(self) -> Sql {
        Sql::from_text(self.clone())
    }
}

macro_rules! impl_into_raw_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoRaw for $ty {
                fn into_raw(self) -> Sql {
                    Sql::from_text(self.to_string())
                }
            }
        )+
    };
}

impl_into_raw_display!(i32, i64, u32, u64, usize, f64);

/// Insert text into SQL without binding it.
///
/// **Never pass user-controlled input here**: the text is not escaped. Use it
/// for identifiers and keywords that cannot be bound.
///
/// ```ignore
/// let table = raw("books");
/// let q = sql!("SELECT * FROM {} WHERE id = {}", table, 7)?;
/// assert_eq!(q.render(), "SELECT * FROM books WHERE id = :1");
/// ```
pub fn raw(value: impl IntoRaw) -> Sql {
    value.into_raw()
}

/// The empty fragment, handy as the "nothing" branch of conditional SQL.
pub fn empty() -> Sql {
    raw("")
}

/// Join values with a separator (`","` in the common case).
///
/// Each value may be a scalar, named bind, column or `Sql`. The separator is
/// inserted verbatim, or, when it is an `Sql`, spliced in with its own binds
/// at every join point. An empty list yields [`empty()`].
///
/// ```ignore
/// let q = join([1, 2, 3], ",");
/// assert_eq!(q.render(), ":1,:2,:3");
/// ```
pub fn join<I>(values: I, separator: impl IntoRaw) -> Sql
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    let args: Vec<Arg> = values.into_iter().map(Into::into).collect();
    if args.is_empty() {
        return empty();
    }
    interleave(args, separator.into_raw())
}

/// [`join`] with an explicit empty-list policy.
pub fn join_with<I>(values: I, separator: impl IntoRaw, policy: EmptyJoinPolicy) -> SqlResult<Sql>
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    let args: Vec<Arg> = values.into_iter().map(Into::into).collect();
    if args.is_empty() {
        return match policy {
            EmptyJoinPolicy::Empty => Ok(empty()),
            EmptyJoinPolicy::Error => Err(SqlError::EmptyJoin),
        };
    }
    Ok(interleave(args, separator.into_raw()))
}

fn interleave(args: Vec<Arg>, separator: Sql) -> Sql {
    let mut parts = Vec::with_capacity(args.len() * 2);
    for (i, arg) in args.into_iter().enumerate() {
        if i > 0 {
            parts.push(Arg::Query(separator.clone()));
        }
        parts.push(arg);
    }
    let strings = vec![String::new(); parts.len() + 1];
    Sql::flatten(strings, parts)
}

impl Sql {
    /// Join `values` using this query as the separator.
    ///
    /// ```ignore
    /// let q = sql!(" ({}) ", 1)?.join([sql!("one = {}", 1)?, sql!("two = {}", 2)?]);
    /// assert_eq!(q.render(), "one = :1 (:1) two = :3");
    /// ```
    pub fn join<I>(&self, values: I) -> Sql
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        join(values, self)
    }

    /// [`Sql::join`] with an explicit empty-list policy.
    pub fn join_with<I>(&self, values: I, policy: EmptyJoinPolicy) -> SqlResult<Sql>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        join_with(values, self, policy)
    }
}
