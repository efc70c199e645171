//! Bind values and template arguments.
//!
//! Three layers:
//! - [`Value`]: a single bindable value (scalar or [`NamedBind`]).
//! - [`Param`]: what a flattened [`Sql`](crate::Sql) stores per placeholder slot,
//!   either one value or a [`Column`] of per-row values.
//! - [`Arg`]: what a template accepts at an interpolation point. On top of
//!   `Param` it also accepts a nested `Sql`, which is spliced away at
//!   construction time.

use crate::bind_defs::{BindDirection, BindType};
use crate::sql::Sql;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A single bindable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(i128),
    Float(f64),
    Text(String),
    Date(DateTime<Utc>),
    Blob(Bytes),
    /// A bind with an explicit placeholder name (`:name`), typically OUT/INOUT.
    ///
    /// Shared by reference: clones of the same `Value::Named` collapse into one
    /// placeholder, two separately built binds with the same name do not.
    Named(Arc<NamedBind>),
}

impl Value {
    pub fn null() -> Self {
        Self::Null
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn blob(value: impl Into<Bytes>) -> Self {
        Self::Blob(value.into())
    }

    pub fn named(bind: NamedBind) -> Self {
        Self::Named(Arc::new(bind))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The placeholder name if this is a named bind.
    pub fn bind_name(&self) -> Option<&str> {
        match self {
            Self::Named(bind) => Some(&bind.name),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::BigInt(v) => serializer.serialize_i128(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Date(v) => v.serialize(serializer),
            Value::Blob(v) => serializer.serialize_bytes(v),
            Value::Named(v) => v.as_ref().serialize(serializer),
        }
    }
}

/// A bind parameter addressed by name rather than position.
///
/// ```ignore
/// let id = Value::named(NamedBind::new("id").out().ty(BindType::Number));
/// let q = sql!("INSERT INTO books (title) VALUES ({}) RETURNING id INTO {}", title, id)?;
/// assert_eq!(q.render(), "INSERT INTO books (title) VALUES (:1) RETURNING id INTO :id");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedBind {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<BindDirection>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<BindType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<Value>,
}

impl NamedBind {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: None,
            ty: None,
            max_size: None,
            val: None,
        }
    }

    pub fn dir(mut self, dir: BindDirection) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Shorthand for `dir(BindDirection::Out)`.
    pub fn out(self) -> Self {
        self.dir(BindDirection::Out)
    }

    /// Shorthand for `dir(BindDirection::InOut)`.
    pub fn in_out(self) -> Self {
        self.dir(BindDirection::InOut)
    }

    pub fn ty(mut self, ty: BindType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Value sent for IN/INOUT binds.
    pub fn val(mut self, val: impl Into<Value>) -> Self {
        self.val = Some(val.into());
        self
    }
}

/// Values that vary per output row, used for bulk execution.
///
/// A column is shared by reference: cloning the handle and interpolating it
/// twice yields one placeholder, while two columns built from equal data get
/// one placeholder each.
#[derive(Debug, Clone, PartialEq)]
pub struct Column(Arc<[Value]>);

impl Column {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        values.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Whether both handles point at the same underlying column.
    pub fn ptr_eq(&self, other: &Column) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const Value as usize
    }
}

impl<T: Into<Value>> FromIterator<T> for Column {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Column {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Column {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A flattened placeholder slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(Value),
    Column(Column),
}

impl Param {
    /// The placeholder name if this slot holds a named bind.
    pub fn bind_name(&self) -> Option<&str> {
        match self {
            Param::Value(value) => value.bind_name(),
            Param::Column(_) => None,
        }
    }
}

/// An interpolation argument accepted by [`Sql::new`] and the `sql!` macro.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Column(Column),
    Query(Sql),
}

// ==================== Conversions ====================

macro_rules! impl_value_from {
    ($variant:ident: $($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

impl_value_from!(Bool: bool);
impl_value_from!(Int: i8, i16, i32, i64, u8, u16, u32);
impl_value_from!(BigInt: i128);
impl_value_from!(Float: f32, f64);
impl_value_from!(Text: String, &str, &String);
impl_value_from!(Blob: Bytes, &'static [u8]);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::BigInt(i128::from(value)), Self::Int)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::from(value as u64)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value.and_time(NaiveTime::MIN).and_utc())
    }
}

impl From<NamedBind> for Value {
    fn from(bind: NamedBind) -> Self {
        Self::named(bind)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

macro_rules! impl_arg_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(value.into())
                }
            }
        )+
    };
}

impl_arg_from_value!(
    Value,
    NamedBind,
    bool,
    i8,
    i16,
    i32,
    i64,
    i128,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &str,
    &String,
    Bytes,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate,
);

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        Arg::Value(value.into())
    }
}

impl From<&Value> for Arg {
    fn from(value: &Value) -> Self {
        Arg::Value(value.clone())
    }
}

impl From<Column> for Arg {
    fn from(column: Column) -> Self {
        Arg::Column(column)
    }
}

impl From<&Column> for Arg {
    fn from(column: &Column) -> Self {
        Arg::Column(column.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Arg {
    fn from(values: Vec<T>) -> Self {
        Arg::Column(values.into())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Arg {
    fn from(values: [T; N]) -> Self {
        Arg::Column(values.into_iter().collect())
    }
}

impl From<Param> for Arg {
    fn from(param: Param) -> Self {
        match param {
            Param::Value(value) => Arg::Value(value),
            Param::Column(column) => Arg::Column(column),
        }
    }
}

impl From<Sql> for Arg {
    fn from(query: Sql) -> Self {
        Arg::Query(query)
    }
}

impl From<&Sql> for Arg {
    fn from(query: &Sql) -> Self {
        Arg::Query(query.clone())
    }
}
