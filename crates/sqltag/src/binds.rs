//! Bind maps produced by [`Sql::values`](crate::Sql::values).
//!
//! A query without array parameters yields one [`BindMap`]. A query with at
//! least one [`Column`](crate::Column) yields one map per row: scalars are
//! repeated in every row, column element `j` lands in row `j`.

use crate::bind_defs::{BindDefs, to_bind_defs};
use crate::error::{SqlError, SqlResult};
use crate::identity::IdentityIndex;
use crate::value::{Param, Value};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder key: a 1-based position (`:3`) or a bind name (`:id`).
///
/// Positions sort before names, matching the placeholder order a reader sees
/// in the rendered SQL for positional binds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindKey {
    Position(usize),
    Name(String),
}

impl BindKey {
    pub(crate) fn for_param(rep: usize, param: &Param) -> Self {
        match param.bind_name() {
            Some(name) => BindKey::Name(name.to_string()),
            None => BindKey::Position(rep + 1),
        }
    }
}

impl fmt::Display for BindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindKey::Position(position) => write!(f, "{position}"),
            BindKey::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for BindKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<usize> for BindKey {
    fn from(position: usize) -> Self {
        BindKey::Position(position)
    }
}

impl From<&str> for BindKey {
    fn from(name: &str) -> Self {
        BindKey::Name(name.to_string())
    }
}

impl From<String> for BindKey {
    fn from(name: String) -> Self {
        BindKey::Name(name)
    }
}

/// One set of bind values keyed by placeholder.
pub type BindMap = BTreeMap<BindKey, Value>;

/// Bind values for a whole statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Binds {
    /// No array parameters: execute once.
    Single(BindMap),
    /// At least one array parameter: execute once per row.
    Rows(Vec<BindMap>),
}

impl Binds {
    pub fn is_bulk(&self) -> bool {
        matches!(self, Binds::Rows(_))
    }

    /// View as rows; a single map is one row.
    pub fn rows(&self) -> &[BindMap] {
        match self {
            Binds::Single(map) => std::slice::from_ref(map),
            Binds::Rows(rows) => rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    pub fn as_single(&self) -> Option<&BindMap> {
        match self {
            Binds::Single(map) => Some(map),
            Binds::Rows(_) => None,
        }
    }

    pub fn into_rows(self) -> Vec<BindMap> {
        match self {
            Binds::Single(map) => vec![map],
            Binds::Rows(rows) => rows,
        }
    }

    /// Infer bind definitions for these values. See [`to_bind_defs`].
    pub fn to_bind_defs(&self, overrides: BindDefs) -> BindDefs {
        to_bind_defs(self.rows(), overrides)
    }
}

/// Common length of all column params, or `None` when there are none.
fn row_count(params: &[Param]) -> SqlResult<Option<usize>> {
    let mut rows = None;
    for (index, param) in params.iter().enumerate() {
        let Param::Column(column) = param else {
            continue;
        };
        match rows {
            None => rows = Some(column.len()),
            Some(expected) if expected != column.len() => {
                return Err(SqlError::ColumnLengthMismatch {
                    expected,
                    found: column.len(),
                    position: index + 1,
                });
            }
            Some(_) => {}
        }
    }
    Ok(rows)
}

pub(crate) fn transpose(params: &[Param], index: &IdentityIndex) -> SqlResult<Binds> {
    let rows = row_count(params)?;

    let unique = params
        .iter()
        .enumerate()
        .filter(|(i, _)| index.is_first(*i))
        .map(|(i, param)| (BindKey::for_param(i, param), param));

    let Some(rows) = rows else {
        let map = unique
            .filter_map(|(key, param)| match param {
                Param::Value(value) => Some((key, value.clone())),
                Param::Column(_) => None,
            })
            .collect();
        return Ok(Binds::Single(map));
    };

    let mut out = vec![BindMap::new(); rows];
    for (key, param) in unique {
        match param {
            Param::Value(value) => {
                for row in &mut out {
                    row.insert(key.clone(), value.clone());
                }
            }
            Param::Column(column) => {
                for (row, value) in out.iter_mut().zip(column) {
                    row.insert(key.clone(), value.clone());
                }
            }
        }
    }
    Ok(Binds::Rows(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Column;

    fn binds(params: Vec<Param>) -> SqlResult<Binds> {
        let index = IdentityIndex::build(&params);
        transpose(&params, &index)
    }

    #[test]
    fn scalars_only_yield_a_single_map() {
        let out = binds(vec![
            Param::Value(1.into()),
            Param::Value(2.into()),
            Param::Value(1.into()),
        ])
        .unwrap();
        let expected: BindMap = [
            (BindKey::Position(1), Value::Int(1)),
            (BindKey::Position(2), Value::Int(2)),
        ]
        .into();
        assert_eq!(out, Binds::Single(expected));
    }

    #[test]
    fn columns_spread_across_rows() {
        let out = binds(vec![
            Param::Column(Column::new(["a", "b"])),
            Param::Value("shared".into()),
        ])
        .unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows()[1][&BindKey::Position(1)], Value::text("b"));
        assert_eq!(out.rows()[1][&BindKey::Position(2)], Value::text("shared"));
    }

    #[test]
    fn mismatched_columns_report_the_offender() {
        let err = binds(vec![
            Param::Column(Column::new(["a", "b"])),
            Param::Value(0.into()),
            Param::Column(Column::new([1, 2, 3])),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SqlError::ColumnLengthMismatch {
                expected: 2,
                found: 3,
                position: 3
            }
        ));
    }

    #[test]
    fn empty_columns_yield_zero_rows() {
        let out = binds(vec![Param::Column(Column::new(Vec::<i64>::new()))]).unwrap();
        assert_eq!(out, Binds::Rows(vec![]));
    }

    #[test]
    fn keys_serialize_as_strings() {
        let map: BindMap = [
            (BindKey::Position(10), Value::Int(1)),
            (BindKey::Position(2), Value::Null),
            (BindKey::from("id"), Value::text("x")),
        ]
        .into();
        let json = serde_json::to_string(&Binds::Single(map)).unwrap();
        assert_eq!(json, r#"{"2":null,"10":1,"id":"x"}"#);
    }
}
