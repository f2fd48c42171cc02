//! Runtime values produced and consumed by evaluation rules.
//!
//! - [`Scalar`]: a single, unpartitioned element. `Scalar::Null` doubles as the
//!   per-row missing marker.
//! - [`Value`]: what a node evaluates to (scalar, partitioned or grouped).
//! - [`Arg`]: what dispatch sees for one argument slot. Besides evaluated
//!   values it can carry an unevaluated tuple of child expressions or mark an
//!   omitted optional argument.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::expr::{Expr, OpKind};
use crate::grouped::GroupedValue;
use crate::partitioned::PartitionedValue;
use crate::type_tag::ArgTag;

/// A single element.
///
/// Totally ordered so it can key groups; floats use [`OrderedFloat`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    Array(Vec<Scalar>),
}

impl Scalar {
    /// `true` for the missing marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Borrow the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Scalar::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Runtime tag of this scalar.
    pub fn tag(&self) -> ArgTag {
        match self {
            Scalar::Null => ArgTag::Null,
            Scalar::Bool(_) => ArgTag::Bool,
            Scalar::Int(_) => ArgTag::Int,
            Scalar::Float(_) => ArgTag::Float,
            Scalar::Str(_) => ArgTag::Str,
            Scalar::Array(_) => ArgTag::Array,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{}", x.0),
            Scalar::Str(s) => write!(f, "{s:?}"),
            Scalar::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(OrderedFloat(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for Scalar {
    fn from(v: Vec<T>) -> Self {
        Scalar::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Scalar::Null, Into::into)
    }
}

/// The evaluated result of one node.
#[derive(Clone, Debug)]
pub enum Value {
    Scalar(Scalar),
    Partitioned(PartitionedValue),
    Grouped(GroupedValue),
}

impl Value {
    pub fn tag(&self) -> ArgTag {
        match self {
            Value::Scalar(s) => s.tag(),
            Value::Partitioned(_) => ArgTag::Partitioned,
            Value::Grouped(_) => ArgTag::Grouped,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_partitioned(&self) -> Option<&PartitionedValue> {
        match self {
            Value::Partitioned(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<PartitionedValue> for Value {
    fn from(p: PartitionedValue) -> Self {
        Value::Partitioned(p)
    }
}

impl From<GroupedValue> for Value {
    fn from(g: GroupedValue) -> Self {
        Value::Grouped(g)
    }
}

/// One runtime argument handed to dispatch.
#[derive(Clone, Debug)]
pub enum Arg {
    Scalar(Scalar),
    Partitioned(PartitionedValue),
    Grouped(GroupedValue),
    /// Child expressions the rule evaluates itself.
    Exprs(Vec<Expr>),
    /// An optional argument that was not supplied.
    Absent,
}

impl Arg {
    pub fn tag(&self) -> ArgTag {
        match self {
            Arg::Scalar(s) => s.tag(),
            Arg::Partitioned(_) => ArgTag::Partitioned,
            Arg::Grouped(_) => ArgTag::Grouped,
            Arg::Exprs(_) => ArgTag::Exprs,
            Arg::Absent => ArgTag::Absent,
        }
    }

    /// Convert back into an evaluated value, if this is one.
    pub fn into_value(self, kind: OpKind) -> Result<Value> {
        match self {
            Arg::Scalar(s) => Ok(Value::Scalar(s)),
            Arg::Partitioned(p) => Ok(Value::Partitioned(p)),
            Arg::Grouped(g) => Ok(Value::Grouped(g)),
            other => Err(Error::UnexpectedOperand {
                kind,
                found: other.tag(),
            }),
        }
    }

    pub fn into_scalar(self, kind: OpKind) -> Result<Scalar> {
        match self {
            Arg::Scalar(s) => Ok(s),
            other => Err(Error::UnexpectedOperand {
                kind,
                found: other.tag(),
            }),
        }
    }

    pub fn into_partitioned(self, kind: OpKind) -> Result<PartitionedValue> {
        match self {
            Arg::Partitioned(p) => Ok(p),
            other => Err(Error::UnexpectedOperand {
                kind,
                found: other.tag(),
            }),
        }
    }

    pub fn into_grouped(self, kind: OpKind) -> Result<GroupedValue> {
        match self {
            Arg::Grouped(g) => Ok(g),
            other => Err(Error::UnexpectedOperand {
                kind,
                found: other.tag(),
            }),
        }
    }

    pub fn into_exprs(self, kind: OpKind) -> Result<Vec<Expr>> {
        match self {
            Arg::Exprs(items) => Ok(items),
            other => Err(Error::UnexpectedOperand {
                kind,
                found: other.tag(),
            }),
        }
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        match v {
            Value::Scalar(s) => Arg::Scalar(s),
            Value::Partitioned(p) => Arg::Partitioned(p),
            Value::Grouped(g) => Arg::Grouped(g),
        }
    }
}
