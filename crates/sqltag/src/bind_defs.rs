//! Bind definitions for strongly-typed bulk execution.
//!
//! Transports that execute one statement against many rows usually need each
//! bind's type and maximum size declared up front, because inferring them
//! from the first row breaks as soon as a later row is longer or the first
//! row holds a `NULL`. [`to_bind_defs`] derives those declarations from the
//! rows themselves.
//!
//! # Example
//!
//! ```ignore
//! let q = sql!("INSERT INTO books (author, genre) VALUES ({}, {})", ["bob", "joe"], "fantasy")?;
//! let defs = q.values()?.to_bind_defs(BindDefs::new());
//! // {1: {dir: IN, type: STRING, maxSize: 3}, 2: {dir: IN, type: STRING, maxSize: 7}}
//! ```

use crate::binds::{BindKey, BindMap};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a bind parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindDirection {
    In,
    Out,
    InOut,
}

/// Wire type of a bind parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindType {
    String,
    Number,
    Date,
    Binary,
    Boolean,
}

impl BindType {
    /// Whether the transport needs a maximum byte size for this type.
    pub fn is_sized(self) -> bool {
        matches!(self, BindType::String | BindType::Binary)
    }
}

/// Declared metadata for one bind key.
///
/// Every field is optional so the same type doubles as an override: fields
/// left as `None` in an override fall back to the inferred value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<BindDirection>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<BindType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,
}

impl BindDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, dir: BindDirection) -> Self {
        self.dir = Some(dir);
        self
    }

    pub fn ty(mut self, ty: BindType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

/// Bind definitions keyed by placeholder.
pub type BindDefs = BTreeMap<BindKey, BindDef>;

/// Infer a [`BindDef`] for every key of `rows`, merging `overrides` field by field.
///
/// Keys come from the first row. For each key:
/// - `ty`: the override, else the first non-null sample (`Text` → `String`,
///   numbers → `Number`, `Date` → `Date`, `Blob` → `Binary`, `Bool` →
///   `Boolean`, named binds → their declared type or their value's type),
///   else `String`.
/// - `max_size` (sized types only): the override, else the largest UTF-8 /
///   byte length over all rows. Nulls count as 1 and the result is at least 1.
/// - `dir`: the override, else a named bind's declared direction, else `In`.
///
/// Override keys missing from `rows` are returned as given; with no rows or no
/// keys, `overrides` is returned unchanged.
pub fn to_bind_defs(rows: &[BindMap], mut overrides: BindDefs) -> BindDefs {
    let Some(first) = rows.first() else {
        return overrides;
    };

    for key in first.keys() {
        let given = overrides.get(key).cloned().unwrap_or_default();
        let samples = || rows.iter().filter_map(|row| row.get(key));

        let ty = given
            .ty
            .or_else(|| samples().find_map(sample_type))
            .unwrap_or(BindType::String);
        let max_size = given.max_size.or_else(|| {
            ty.is_sized().then(|| {
                rows.iter()
                    .map(|row| row.get(key).map_or(1, sample_size))
                    .max()
                    .unwrap_or(1)
                    .max(1)
            })
        });
        let dir = given
            .dir
            .or_else(|| samples().find_map(sample_dir))
            .unwrap_or(BindDirection::In);

        overrides.insert(
            key.clone(),
            BindDef {
                dir: Some(dir),
                ty: Some(ty),
                max_size,
            },
        );
    }
    overrides
}

fn sample_type(value: &Value) -> Option<BindType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(BindType::Boolean),
        Value::Int(_) | Value::BigInt(_) | Value::Float(_) => Some(BindType::Number),
        Value::Text(_) => Some(BindType::String),
        Value::Date(_) => Some(BindType::Date),
        Value::Blob(_) => Some(BindType::Binary),
        Value::Named(bind) => bind.ty.or_else(|| bind.val.as_ref().and_then(sample_type)),
    }
}

fn sample_dir(value: &Value) -> Option<BindDirection> {
    match value {
        Value::Named(bind) => bind.dir,
        _ => None,
    }
}

fn sample_size(value: &Value) -> usize {
    match value {
        Value::Null => 1,
        Value::Text(text) => text.len(),
        Value::Blob(blob) => blob.len(),
        Value::Bool(v) => v.to_string().len(),
        Value::Int(v) => v.to_string().len(),
        Value::BigInt(v) => v.to_string().len(),
        Value::Float(v) => v.to_string().len(),
        Value::Date(v) => v.to_rfc3339().len(),
        Value::Named(bind) => bind
            .max_size
            .or_else(|| bind.val.as_ref().map(sample_size))
            .unwrap_or(1),
    }
}
