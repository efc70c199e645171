//! Placeholder identity: which slots of a query share one bind placeholder.
//!
//! Primitive values are matched by value, with numbers compared numerically
//! across `Int`/`BigInt`/`Float` (`NaN` matches `NaN`, `-0.0` matches `0.0`).
//! Columns and named binds are matched by reference.

use crate::value::{Param, Value};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Number {
    Integral(i128),
    /// Bit pattern of a non-integral float (NaN canonicalized).
    Fractional(u64),
}

impl Number {
    fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Number::Fractional(f64::NAN.to_bits());
        }
        // Range check keeps the cast lossless.
        if value.fract() == 0.0 && value >= i128::MIN as f64 && value < i128::MAX as f64 {
            return Number::Integral(value as i128);
        }
        Number::Fractional(value.to_bits())
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum Primitive<'a> {
    Null,
    Bool(bool),
    Number(Number),
    Text(&'a str),
    Date(DateTime<Utc>),
    Blob(&'a [u8]),
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum Reference {
    Column(usize),
    Named(usize),
}

enum Identity<'a> {
    Value(Primitive<'a>),
    Ref(Reference),
}

fn identity_of(param: &Param) -> Identity<'_> {
    let value = match param {
        Param::Column(column) => return Identity::Ref(Reference::Column(column.addr())),
        Param::Value(value) => value,
    };
    let primitive = match value {
        Value::Named(bind) => {
            return Identity::Ref(Reference::Named(std::sync::Arc::as_ptr(bind) as usize));
        }
        Value::Null => Primitive::Null,
        Value::Bool(v) => Primitive::Bool(*v),
        Value::Int(v) => Primitive::Number(Number::Integral(i128::from(*v))),
        Value::BigInt(v) => Primitive::Number(Number::Integral(*v)),
        Value::Float(v) => Primitive::Number(Number::from_f64(*v)),
        Value::Text(v) => Primitive::Text(v),
        Value::Date(v) => Primitive::Date(*v),
        Value::Blob(v) => Primitive::Blob(v),
    };
    Identity::Value(primitive)
}

/// Representative slot for every slot of a flattened query.
///
/// `rep(i)` is the index of the first slot holding the same value as slot `i`
/// (`i` itself for a first occurrence).
#[derive(Debug, Clone)]
pub(crate) struct IdentityIndex {
    reps: Vec<usize>,
}

impl IdentityIndex {
    pub(crate) fn build(params: &[Param]) -> Self {
        let mut by_value: HashMap<Primitive<'_>, usize> = HashMap::new();
        let mut by_ref: HashMap<Reference, usize> = HashMap::new();

        let reps = params
            .iter()
            .enumerate()
            .map(|(index, param)| match identity_of(param) {
                Identity::Value(key) => *by_value.entry(key).or_insert(index),
                Identity::Ref(key) => *by_ref.entry(key).or_insert(index),
            })
            .collect();

        Self { reps }
    }

    pub(crate) fn rep(&self, index: usize) -> usize {
        self.reps[index]
    }

    pub(crate) fn is_first(&self, index: usize) -> bool {
        self.reps[index] == index
    }
}
