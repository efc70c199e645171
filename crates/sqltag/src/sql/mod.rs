//! Composable SQL templates.
//!
//! An [`Sql`] is literal text with values interpolated between the pieces.
//! Values never end up in the text: each one becomes a `:N` placeholder (or
//! `:name` for a [`NamedBind`](crate::NamedBind)) and is returned separately
//! by [`Sql::values`].
//!
//! Templates nest. Interpolating an `Sql` splices its text and values into the
//! outer template, so fragments can be built independently and combined.
//!
//! # Example
//!
//! ```ignore
//! use sqltag::{join, sql};
//!
//! let ids = join([1, 2, 3], ", ");
//! let q = sql!("SELECT * FROM books WHERE id IN ({}) AND author = {}", ids, "Blake")?;
//!
//! assert_eq!(q.render(), "SELECT * FROM books WHERE id IN (:1, :2, :3) AND author = :4");
//! ```
//!
//! Equal primitive values share one placeholder:
//!
//! ```ignore
//! let q = sql!("a={},b={},c={},d={}", 1, 2, 1, 3)?;
//! assert_eq!(q.render(), "a=:1,b=:2,c=:1,d=:4");
//! ```

mod builder;
mod fragments;
mod render;

pub use builder::Sql;
pub use fragments::{IntoRaw, empty, join, join_with, raw};

/// Build an [`Sql`] from a template and arguments.
///
/// `{}` marks an interpolation point; `{{` and `}}` produce literal braces.
/// Arguments may be anything convertible into [`Arg`](crate::Arg): scalars,
/// [`NamedBind`](crate::NamedBind)s, vectors/arrays/[`Column`](crate::Column)s
/// for bulk rows, or other `Sql` values to splice in.
///
/// Evaluates to `SqlResult<Sql>`; a mismatch between `{}` markers and
/// arguments is reported as [`SqlError::ValueCountMismatch`](crate::SqlError).
///
/// ```ignore
/// let q = sql!("UPDATE books SET title = {} WHERE id = {}", title, id)?;
/// ```
#[macro_export]
macro_rules! sql {
    ($template:expr $(,)?) => {
        $crate::Sql::from_template($template, ::std::vec::Vec::<$crate::Arg>::new())
    };
    ($template:expr, $($arg:expr),+ $(,)?) => {
        $crate::Sql::from_template($template, ::std::vec![$($crate::Arg::from($arg)),+])
    };
}

/// Split a `{}` template into its literal segments.
pub(crate) fn split_template(template: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) => {
                chars.next();
                current.push('{');
            }
            ('{', Some('}')) => {
                chars.next();
                segments.push(std::mem::take(&mut current));
            }
            ('}', Some('}')) => {
                chars.next();
                current.push('}');
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Collapse horizontal whitespace that follows a newline.
pub(crate) fn collapse_indentation(text: String) -> String {
    if !text.contains('\n') {
        return text;
    }
    let mut out = String::with_capacity(text.len());
    let mut after_newline = false;
    for c in text.chars() {
        if after_newline && (c == ' ' || c == '\t') {
            continue;
        }
        after_newline = c == '\n';
        out.push(c);
    }
    out
}
