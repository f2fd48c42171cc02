//! Two-phase aggregations and the contexts that run them.
//!
//! An [`Aggregation`] is a pure `(chunk, combine)` pair:
//! - `chunk` reduces the rows of one partition (or of one group inside one
//!   partition) to a single partial result, and may run on any worker;
//! - `combine` folds the partial results, in partition order, into the final
//!   value. It only starts once every chunk it depends on has finished.
//!
//! Aggregations know nothing about grouping. An [`AggContext`] decides whether
//! the pair runs once over the whole column ([`Summarize`], [`Transform`]) or
//! once per group ([`GroupBy`], [`GroupedValue::agg`](crate::GroupedValue::agg)).
//!
//! Built-ins:
//! - [`CollectList`] (`collect_list`) -- every row, in partition order then
//!   arrival order within the partition.
//! - [`Count`] (`count`) -- number of non-null rows.
//! - [`NamedAggregation`] -- any other pair given as closures.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::OpKind;
use crate::partitioned::PartitionedValue;
use crate::runner::Runner;
use crate::value::{Scalar, Value};

/// A reduction split into a partition-local and a cross-partition phase.
pub trait Aggregation: Send + Sync {
    fn name(&self) -> &str;

    /// Reduce the rows of one partition (or group-in-partition).
    fn chunk(&self, rows: &[Scalar]) -> Scalar;

    /// Fold chunk results, given in partition order.
    fn combine(&self, chunks: Vec<Scalar>) -> Scalar;
}

/// Run `agg` over every partition of `data` and combine the partials.
pub fn aggregate(runner: &Runner, data: &PartitionedValue, agg: &dyn Aggregation) -> Scalar {
    let parts = data.partitions();
    let chunks = runner.run_indexed(parts.len(), |i| agg.chunk(&parts[i].as_slice()));
    agg.combine(chunks)
}

/* ===================== CollectList ===================== */

/// Gather every row into one list.
///
/// - Chunk: the partition's rows as an array.
/// - Combine: the chunk arrays flattened in partition order.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectList;

impl Aggregation for CollectList {
    fn name(&self) -> &str {
        "collect_list"
    }

    fn chunk(&self, rows: &[Scalar]) -> Scalar {
        Scalar::Array(rows.to_vec())
    }

    fn combine(&self, chunks: Vec<Scalar>) -> Scalar {
        let mut out = Vec::new();
        for chunk in chunks {
            if let Scalar::Array(items) = chunk {
                out.extend(items);
            }
        }
        Scalar::Array(out)
    }
}

/* ===================== Count ===================== */

/// Number of non-null rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl Aggregation for Count {
    fn name(&self) -> &str {
        "count"
    }

    fn chunk(&self, rows: &[Scalar]) -> Scalar {
        Scalar::Int(rows.iter().filter(|s| !s.is_null()).count() as i64)
    }

    fn combine(&self, chunks: Vec<Scalar>) -> Scalar {
        let total = chunks
            .iter()
            .map(|c| match c {
                Scalar::Int(n) => *n,
                _ => 0,
            })
            .sum();
        Scalar::Int(total)
    }
}

/* ===================== NamedAggregation ===================== */

type ChunkFn = Arc<dyn Fn(&[Scalar]) -> Scalar + Send + Sync>;
type CombineFn = Arc<dyn Fn(Vec<Scalar>) -> Scalar + Send + Sync>;

/// An aggregation assembled from a name and two closures.
///
/// ```
/// use arrayflow::{Aggregation, NamedAggregation, Scalar};
///
/// let max_len = NamedAggregation::new(
///     "max_len",
///     |rows| Scalar::Int(rows.len() as i64),
///     |chunks| chunks.into_iter().max().unwrap_or(Scalar::Null),
/// );
/// assert_eq!(max_len.name(), "max_len");
/// ```
#[derive(Clone)]
pub struct NamedAggregation {
    name: String,
    chunk: ChunkFn,
    combine: CombineFn,
}

impl NamedAggregation {
    pub fn new<C, M>(name: impl Into<String>, chunk: C, combine: M) -> Self
    where
        C: Fn(&[Scalar]) -> Scalar + Send + Sync + 'static,
        M: Fn(Vec<Scalar>) -> Scalar + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            chunk: Arc::new(chunk),
            combine: Arc::new(combine),
        }
    }
}

impl fmt::Debug for NamedAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedAggregation")
            .field("name", &self.name)
            .finish()
    }
}

impl Aggregation for NamedAggregation {
    fn name(&self) -> &str {
        &self.name
    }

    fn chunk(&self, rows: &[Scalar]) -> Scalar {
        (self.chunk)(rows)
    }

    fn combine(&self, chunks: Vec<Scalar>) -> Scalar {
        (self.combine)(chunks)
    }
}

/* ===================== Contexts ===================== */

/// The grouped-or-ungrouped environment an aggregate runs in.
pub trait AggContext: Send + Sync {
    fn agg(&self, runner: &Runner, data: &PartitionedValue, agg: &dyn Aggregation)
    -> Result<Value>;

    /// Aggregate only the rows whose `mask` row is `Bool(true)`.
    ///
    /// `mask` is row-aligned with `data`. The default drops masked rows and
    /// then runs [`agg`](Self::agg); contexts whose output is shaped by the
    /// input rows override it.
    fn agg_where(
        &self,
        kind: OpKind,
        runner: &Runner,
        data: &PartitionedValue,
        mask: &PartitionedValue,
        agg: &dyn Aggregation,
    ) -> Result<Value> {
        self.agg(runner, &data.filter(kind, mask, runner)?, agg)
    }
}

/// Reduce the whole column to one scalar.
#[derive(Clone, Copy, Debug, Default)]
pub struct Summarize;

impl AggContext for Summarize {
    fn agg(
        &self,
        runner: &Runner,
        data: &PartitionedValue,
        agg: &dyn Aggregation,
    ) -> Result<Value> {
        Ok(Value::Scalar(aggregate(runner, data, agg)))
    }
}

/// Reduce the whole column, then repeat the result on every input row.
#[derive(Clone, Copy, Debug, Default)]
pub struct Transform;

impl AggContext for Transform {
    fn agg(
        &self,
        runner: &Runner,
        data: &PartitionedValue,
        agg: &dyn Aggregation,
    ) -> Result<Value> {
        let result = aggregate(runner, data, agg);
        Ok(Value::Partitioned(PartitionedValue::constant(
            result,
            &data.layout(),
        )))
    }

    /// The result covers every input row, masked or not.
    fn agg_where(
        &self,
        kind: OpKind,
        runner: &Runner,
        data: &PartitionedValue,
        mask: &PartitionedValue,
        agg: &dyn Aggregation,
    ) -> Result<Value> {
        let result = aggregate(runner, &data.filter(kind, mask, runner)?, agg);
        Ok(Value::Partitioned(PartitionedValue::constant(
            result,
            &data.layout(),
        )))
    }
}

/// Reduce per distinct key; one output row per key, keys ascending.
#[derive(Clone, Debug)]
pub struct GroupBy {
    keys: PartitionedValue,
}

impl GroupBy {
    pub fn new(keys: PartitionedValue) -> Self {
        Self { keys }
    }
}

impl AggContext for GroupBy {
    fn agg(
        &self,
        runner: &Runner,
        data: &PartitionedValue,
        agg: &dyn Aggregation,
    ) -> Result<Value> {
        let grouped = data.group_by(&self.keys, runner)?;
        Ok(Value::Partitioned(grouped.agg(runner, agg)))
    }

    /// Masked rows leave their group, and a group left empty disappears.
    fn agg_where(
        &self,
        kind: OpKind,
        runner: &Runner,
        data: &PartitionedValue,
        mask: &PartitionedValue,
        agg: &dyn Aggregation,
    ) -> Result<Value> {
        if self.keys.len() != data.len() {
            return Err(Error::KeyLengthMismatch {
                expected: data.len(),
                found: self.keys.len(),
            });
        }
        let mask = mask.realign(kind, &data.layout())?;
        let keys = self.keys.realign(kind, &data.layout())?;
        let kept = data.filter(kind, &mask, runner)?;
        let kept_keys = keys.filter(kind, &mask, runner)?;
        let grouped = kept.group_by(&kept_keys, runner)?;
        Ok(Value::Partitioned(grouped.agg(runner, agg)))
    }
}
