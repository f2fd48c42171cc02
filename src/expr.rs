//! Expression tree nodes.
//!
//! An [`Expr`] is immutable once built. Leaves ([`Expr::Column`],
//! [`Expr::Literal`]) are resolved by the driver directly; every other node is
//! tagged with an [`OpKind`] and evaluated by whichever rule the
//! [`Registry`](crate::Registry) selects for its runtime arguments.
//!
//! ```ignore
//! use arrayflow::Expr;
//!
//! // [a, b, 7][1]
//! let e = Expr::array(vec![Expr::col("a"), Expr::col("b"), Expr::lit(7i64)]).index(1);
//! ```

use std::fmt;

use crate::value::Scalar;

/// Dispatchable operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    ArrayLength,
    ArrayIndex,
    Array,
    ArrayCollect,
    ArrayConcat,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            OpKind::ArrayLength => "ArrayLength",
            OpKind::ArrayIndex => "ArrayIndex",
            OpKind::Array => "Array",
            OpKind::ArrayCollect => "ArrayCollect",
            OpKind::ArrayConcat => "ArrayConcat",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Reads a column bound in the evaluation scope.
    Column(String),
    Literal(Scalar),
    ArrayLength(Box<Expr>),
    /// `arg[index]`, with one index for every row.
    ArrayIndex { arg: Box<Expr>, index: i64 },
    /// Row-wise array built from each item's value.
    Array(Vec<Expr>),
    /// Row-wise concatenation of array-valued items.
    ArrayConcat(Vec<Expr>),
    /// Aggregate collecting values into a list, optionally filtered.
    ArrayCollect {
        arg: Box<Expr>,
        filter: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn lit(value: impl Into<Scalar>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn array(items: Vec<Expr>) -> Self {
        Expr::Array(items)
    }

    pub fn concat(items: Vec<Expr>) -> Self {
        Expr::ArrayConcat(items)
    }

    pub fn length(self) -> Self {
        Expr::ArrayLength(Box::new(self))
    }

    pub fn index(self, index: i64) -> Self {
        Expr::ArrayIndex {
            arg: Box::new(self),
            index,
        }
    }

    pub fn collect(self) -> Self {
        Expr::ArrayCollect {
            arg: Box::new(self),
            filter: None,
        }
    }

    pub fn collect_where(self, filter: Expr) -> Self {
        Expr::ArrayCollect {
            arg: Box::new(self),
            filter: Some(Box::new(filter)),
        }
    }

    /// Operation kind, or `None` for leaves.
    pub fn kind(&self) -> Option<OpKind> {
        match self {
            Expr::Column(_) | Expr::Literal(_) => None,
            Expr::ArrayLength(_) => Some(OpKind::ArrayLength),
            Expr::ArrayIndex { .. } => Some(OpKind::ArrayIndex),
            Expr::Array(_) => Some(OpKind::Array),
            Expr::ArrayConcat(_) => Some(OpKind::ArrayConcat),
            Expr::ArrayCollect { .. } => Some(OpKind::ArrayCollect),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal(s) => write!(f, "{s}"),
            Expr::ArrayLength(arg) => write!(f, "length({arg})"),
            Expr::ArrayIndex { arg, index } => write!(f, "{arg}[{index}]"),
            Expr::Array(items) => {
                f.write_str("array(")?;
                list(f, items)?;
                f.write_str(")")
            }
            Expr::ArrayConcat(items) => {
                f.write_str("concat(")?;
                list(f, items)?;
                f.write_str(")")
            }
            Expr::ArrayCollect { arg, filter: None } => write!(f, "collect({arg})"),
            Expr::ArrayCollect {
                arg,
                filter: Some(w),
            } => write!(f, "collect({arg} where {w})"),
        }
    }
}
