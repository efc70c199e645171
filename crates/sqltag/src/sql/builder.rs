use super::split_template;
use crate::bind_defs::BindDefs;
use crate::binds::{Binds, transpose};
use crate::error::{SqlError, SqlResult};
use crate::identity::IdentityIndex;
use crate::value::{Arg, Param};
use std::fmt;
use std::sync::OnceLock;

/// A flattened SQL template: `strings.len() == params.len() + 1`.
///
/// Nested templates are spliced in at construction, so `params` only ever
/// holds values and columns. The placeholder index, rendered text and bind
/// values are computed on first use and cached; an `Sql` is never mutated
/// after construction, composition always builds a new one.
#[must_use]
#[derive(Clone)]
pub struct Sql {
    pub(super) strings: Vec<String>,
    pub(super) params: Vec<Param>,
    index: OnceLock<IdentityIndex>,
    pub(super) text: OnceLock<String>,
    binds: OnceLock<Binds>,
}

impl Sql {
    /// Build a query from literal segments and the arguments between them.
    ///
    /// `strings` must hold exactly one more segment than `args`.
    pub fn new<S, A>(
        strings: impl IntoIterator<Item = S>,
        args: impl IntoIterator<Item = A>,
    ) -> SqlResult<Self>
    where
        S: Into<String>,
        A: Into<Arg>,
    {
        let strings: Vec<String> = strings.into_iter().map(Into::into).collect();
        let args: Vec<Arg> = args.into_iter().map(Into::into).collect();

        if strings.is_empty() {
            return Err(SqlError::MissingLiterals);
        }
        if strings.len() != args.len() + 1 {
            return Err(SqlError::ValueCountMismatch {
                literals: strings.len(),
                expected: strings.len() - 1,
                found: args.len(),
            });
        }
        Ok(Self::flatten(strings, args))
    }

    /// Build a query from a `{}` template. This is what [`sql!`](crate::sql!) expands to.
    pub fn from_template<A: Into<Arg>>(
        template: &str,
        args: impl IntoIterator<Item = A>,
    ) -> SqlResult<Self> {
        Self::new(split_template(template), args)
    }

    /// Literal text only, no placeholders.
    pub(super) fn from_text(text: String) -> Self {
        Self::from_parts(vec![text], Vec::new())
    }

    fn from_parts(strings: Vec<String>, params: Vec<Param>) -> Self {
        Self {
            strings,
            params,
            index: OnceLock::new(),
            text: OnceLock::new(),
            binds: OnceLock::new(),
        }
    }

    /// Splice nested queries into one flat template.
    ///
    /// Callers guarantee `strings.len() == args.len() + 1`. Children are flat
    /// already, so one level of splicing handles any nesting depth.
    pub(super) fn flatten(strings: Vec<String>, args: Vec<Arg>) -> Self {
        let capacity = args
            .iter()
            .map(|arg| match arg {
                Arg::Query(child) => child.params.len(),
                _ => 1,
            })
            .sum::<usize>();
        let mut flat_strings = Vec::with_capacity(capacity + 1);
        let mut flat_params = Vec::with_capacity(capacity);

        let mut strings = strings.into_iter();
        let mut current = strings.next().unwrap_or_default();

        for (arg, tail) in args.into_iter().zip(strings) {
            match arg {
                Arg::Query(child) => {
                    let mut child_strings = child.strings.into_iter();
                    current.push_str(&child_strings.next().unwrap_or_default());
                    for (param, text) in child.params.into_iter().zip(child_strings) {
                        flat_strings.push(std::mem::replace(&mut current, text));
                        flat_params.push(param);
                    }
                    current.push_str(&tail);
                }
                Arg::Value(value) => {
                    flat_strings.push(std::mem::replace(&mut current, tail));
                    flat_params.push(Param::Value(value));
                }
                Arg::Column(column) => {
                    flat_strings.push(std::mem::replace(&mut current, tail));
                    flat_params.push(Param::Column(column));
                }
            }
        }
        flat_strings.push(current);

        Self::from_parts(flat_strings, flat_params)
    }

    /// Literal segments between placeholders.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Placeholder slots in textual order, duplicates included.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// `true` when the query has no text and no placeholders.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.strings.iter().all(String::is_empty)
    }

    pub(super) fn index(&self) -> &IdentityIndex {
        self.index
            .get_or_init(|| IdentityIndex::build(&self.params))
    }

    /// Bind values keyed by the placeholders of [`render`](Sql::render).
    ///
    /// Repeated values appear once, under the key of their first occurrence.
    /// With array parameters the result holds one map per row; arrays of
    /// different lengths fail here with
    /// [`SqlError::ColumnLengthMismatch`], never at construction.
    pub fn values(&self) -> SqlResult<&Binds> {
        if let Some(binds) = self.binds.get() {
            return Ok(binds);
        }
        let binds = transpose(&self.params, self.index())?;
        Ok(self.binds.get_or_init(|| binds))
    }

    /// Shorthand for `self.values()?.to_bind_defs(overrides)`.
    pub fn bind_defs(&self, overrides: BindDefs) -> SqlResult<BindDefs> {
        Ok(self.values()?.to_bind_defs(overrides))
    }
}

impl Default for Sql {
    fn default() -> Self {
        Self::from_text(String::new())
    }
}

impl PartialEq for Sql {
    fn eq(&self, other: &Self) -> bool {
        self.strings == other.strings && self.params == other.params
    }
}

impl fmt::Debug for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Sql");
        out.field("sql", &self.render());
        match self.values() {
            Ok(values) => out.field("values", values),
            Err(err) => out.field("values", &err),
        };
        out.finish()
    }
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render())
    }
}
