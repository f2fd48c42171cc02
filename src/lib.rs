//! # Arrayflow
//!
//! The **execution core for array operations** of a columnar query engine.
//! Arrayflow evaluates expression trees over partitioned columns: every
//! operation node is matched, by its kind and the runtime shapes of its
//! arguments, against an open registry of evaluation rules, and the chosen
//! rule produces a new (partitioned or scalar) value.
//!
//! ## Key Features
//!
//! - **Open multiple dispatch** - rules are keyed by operation kind *and*
//!   argument shapes, the most specific pattern wins, and new rules can be
//!   registered at any time
//! - **Partition-aware evaluation** - per-partition work runs sequentially or
//!   on Rayon, with identical results
//! - **Lazy broadcasting** - scalars combined with columns become constant
//!   partitions instead of repeated rows
//! - **Two-phase aggregation** - `(chunk, combine)` pairs run unchanged over
//!   whole columns or per group
//! - **Total row semantics** - missing arrays and out-of-bounds indexes yield
//!   `Null` rows, never errors
//!
//! ## Quick Start
//!
//! ```
//! use arrayflow::*;
//!
//! # fn main() -> arrayflow::Result<()> {
//! let exec = Executor::new(&ExecConfig::sequential())?;
//!
//! let scope = Scope::new()
//!     .with("a", PartitionedValue::from_rows(vec![1i64.into(), 2i64.into()], 2))
//!     .with("b", PartitionedValue::from_rows(vec!["x".into(), "y".into()], 2));
//!
//! // array(a, b, true)
//! let e = Expr::array(vec![Expr::col("a"), Expr::col("b"), Expr::lit(true)]);
//! let out = exec.execute(&e, &scope, None)?;
//! let rows = out.as_partitioned().map(PartitionedValue::rows).unwrap_or_default();
//! assert_eq!(rows[1], Scalar::from(vec![Scalar::Int(2), "y".into(), true.into()]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Values
//!
//! A node evaluates to a [`Value`]: a single [`Scalar`], a
//! [`PartitionedValue`] (a column split into independent [`Partition`]s), or
//! a [`GroupedValue`] (a column already grouped by key upstream).
//!
//! ### Dispatch
//!
//! The [`Registry`] maps `(OpKind, Pattern)` to a [`Rule`]. A [`Pattern`] is a
//! list of [`Slot`]s that accept an exact [`ArgTag`] or a supertype. When more
//! than one pattern matches, the one with the fewest widening slots wins.
//!
//! ### Aggregation
//!
//! Aggregations implement [`Aggregation`] as a `(chunk, combine)` pair. The
//! [`AggContext`] passed to [`Executor::execute`] decides how they run:
//! [`Summarize`] (one scalar), [`Transform`] (result repeated on every row) or
//! [`GroupBy`] (one row per key).
//!
//! ## Module Overview
//!
//! - [`dispatch`] - the rule registry
//! - [`arrays`] - built-in array rules
//! - [`broadcast`] - scalar/column reconciliation
//! - [`aggregate`] - two-phase aggregations and contexts
//! - [`executor`] - the evaluation driver
//! - [`partitioned`] / [`grouped`] - column representations
//! - [`runner`] - configuration and partition-parallel execution
//! - [`testing`] - fixtures and assertions for tests

pub mod aggregate;
pub mod arrays;
pub mod broadcast;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod expr;
pub mod grouped;
pub mod partitioned;
pub mod runner;
pub mod testing;
pub mod type_tag;
pub mod value;

pub use aggregate::{
    aggregate, AggContext, Aggregation, CollectList, Count, GroupBy, NamedAggregation, Summarize,
    Transform,
};
pub use dispatch::{Registry, Rule};
pub use error::{Error, Result};
pub use executor::{Executor, Scope, Session};
pub use expr::{Expr, OpKind};
pub use grouped::GroupedValue;
pub use partitioned::{Layout, Partition, PartitionedValue};
pub use runner::{ExecConfig, ExecMode, Runner};
pub use type_tag::{ArgTag, Pattern, Slot};
pub use value::{Arg, Scalar, Value};
