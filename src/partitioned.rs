//! Partitioned columns.
//!
//! A [`PartitionedValue`] is an ordered list of [`Partition`]s. Each partition
//! is independent: rules process partitions concurrently through the
//! [`Runner`] and never share mutable state between them. Row correspondence
//! between sibling columns is positional, which is why [`Layout`] (the list of
//! partition lengths) matters whenever two columns are zipped.
//!
//! Broadcasting a scalar creates [`Partition::Constant`] blocks that store the
//! value once plus a length. Row-wise rules keep constant blocks constant when
//! every input is constant, so broadcasts are only expanded when they meet
//! materialized rows.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::expr::OpKind;
use crate::grouped::GroupedValue;
use crate::runner::Runner;
use crate::value::Scalar;

/// One independently processable block of rows.
#[derive(Clone, Debug)]
pub enum Partition {
    Rows(Arc<Vec<Scalar>>),
    /// `len` copies of `value`, never expanded in memory.
    Constant { value: Scalar, len: usize },
}

impl Partition {
    pub fn rows(rows: Vec<Scalar>) -> Self {
        Partition::Rows(Arc::new(rows))
    }

    pub fn len(&self) -> usize {
        match self {
            Partition::Rows(rows) => rows.len(),
            Partition::Constant { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Partition::Constant { .. })
    }

    /// Row `i` of this partition. Panics when `i >= len()`, like slice indexing.
    pub fn row(&self, i: usize) -> &Scalar {
        match self {
            Partition::Rows(rows) => &rows[i],
            Partition::Constant { value, len } => {
                assert!(i < *len, "row {i} out of bounds for partition of {len}");
                value
            }
        }
    }

    /// The broadcast value of a constant block, even when it is empty.
    pub fn constant_value(&self) -> Option<&Scalar> {
        match self {
            Partition::Constant { value, .. } => Some(value),
            Partition::Rows(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scalar> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    pub fn to_vec(&self) -> Vec<Scalar> {
        self.iter().cloned().collect()
    }

    /// Borrow materialized rows; constant blocks are expanded.
    pub fn as_slice(&self) -> Cow<'_, [Scalar]> {
        match self {
            Partition::Rows(rows) => Cow::Borrowed(rows.as_slice()),
            Partition::Constant { .. } => Cow::Owned(self.to_vec()),
        }
    }

    fn map(&self, f: &(dyn Fn(&Scalar) -> Scalar + Sync)) -> Partition {
        match self {
            Partition::Constant { value, len } => Partition::Constant {
                value: f(value),
                len: *len,
            },
            Partition::Rows(rows) => Partition::rows(rows.iter().map(f).collect()),
        }
    }
}

/// Partition lengths of a column, in partition order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout(Vec<usize>);

impl Layout {
    /// Exactly `max(n, 1)` partitions covering `len` rows, sizes differing by at most one.
    pub fn even(len: usize, n: usize) -> Self {
        let n = n.max(1);
        let base = len / n;
        let extra = len % n;
        Layout((0..n).map(|i| base + usize::from(i < extra)).collect())
    }

    pub fn from_sizes(sizes: Vec<usize>) -> Self {
        Layout(sizes)
    }

    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition_count(&self) -> usize {
        self.0.len()
    }
}

/// A column split into independently processable partitions.
#[derive(Clone, Debug)]
pub struct PartitionedValue {
    partitions: Vec<Partition>,
}

impl PartitionedValue {
    pub fn from_parts(partitions: Vec<Partition>) -> Self {
        Self { partitions }
    }

    /// Build from explicit per-partition rows.
    pub fn from_partitions(parts: Vec<Vec<Scalar>>) -> Self {
        Self::from_parts(parts.into_iter().map(Partition::rows).collect())
    }

    /// Split `rows` evenly into `n` partitions.
    pub fn from_rows(rows: Vec<Scalar>, n: usize) -> Self {
        let layout = Layout::even(rows.len(), n);
        Self::split_by(rows, &layout)
    }

    /// Broadcast `value` over `layout` without materializing rows.
    pub fn constant(value: Scalar, layout: &Layout) -> Self {
        Self::from_parts(
            layout
                .sizes()
                .iter()
                .map(|&len| Partition::Constant {
                    value: value.clone(),
                    len,
                })
                .collect(),
        )
    }

    /// `length` copies of `value` over `partition_count` even partitions.
    pub fn materialize_constant(value: Scalar, length: usize, partition_count: usize) -> Self {
        Self::constant(value, &Layout::even(length, partition_count))
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn layout(&self) -> Layout {
        Layout(self.partitions.iter().map(Partition::len).collect())
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scalar> + '_ {
        self.partitions.iter().flat_map(Partition::iter)
    }

    /// All rows, in partition order.
    pub fn rows(&self) -> Vec<Scalar> {
        self.iter().cloned().collect()
    }

    /// Per-partition rows, for inspection.
    pub fn to_partitions(&self) -> Vec<Vec<Scalar>> {
        self.partitions.iter().map(Partition::to_vec).collect()
    }

    /// Apply `f` to every row, keeping the layout.
    pub fn map_rows<F>(&self, runner: &Runner, f: F) -> Self
    where
        F: Fn(&Scalar) -> Scalar + Send + Sync,
    {
        let parts = runner.run_indexed(self.partitions.len(), |i| self.partitions[i].map(&f));
        Self::from_parts(parts)
    }

    /// Re-split this column over `layout`, which must cover the same number of rows.
    pub fn realign(&self, kind: OpKind, layout: &Layout) -> Result<Self> {
        if self.len() != layout.len() {
            return Err(Error::ShapeMismatch {
                kind,
                expected: layout.len(),
                found: self.len(),
            });
        }
        if self.layout() == *layout {
            return Ok(self.clone());
        }
        debug!(
            %kind,
            from = self.partition_count(),
            to = layout.partition_count(),
            "realigning partitions"
        );
        Ok(self.realigned(layout))
    }

    /// Re-split over a layout already known to cover `self.len()` rows.
    pub(crate) fn realigned(&self, layout: &Layout) -> Self {
        if self.layout() == *layout {
            return self.clone();
        }
        if let Some(value) = self.uniform_constant() {
            return Self::constant(value.clone(), layout);
        }
        Self::split_by(self.rows(), layout)
    }

    /// Keep rows whose `mask` row is `Bool(true)`; null or false drops the row.
    pub fn filter(&self, kind: OpKind, mask: &PartitionedValue, runner: &Runner) -> Result<Self> {
        let mask = mask.realign(kind, &self.layout())?;
        let parts = runner.run_indexed(self.partitions.len(), |i| {
            let data = &self.partitions[i];
            let keep = &mask.partitions[i];
            Partition::rows(
                data.iter()
                    .zip(keep.iter())
                    .filter(|(_, m)| matches!(m, Scalar::Bool(true)))
                    .map(|(v, _)| v.clone())
                    .collect(),
            )
        });
        Ok(Self::from_parts(parts))
    }

    /// Group rows by the row-aligned `keys` column.
    pub fn group_by(&self, keys: &PartitionedValue, runner: &Runner) -> Result<GroupedValue> {
        GroupedValue::new(self, keys, runner)
    }

    /// Stack columns row-wise into arrays: row `i` is `[c0[i], c1[i], ..]`.
    ///
    /// Columns of equal length but different layouts are realigned to the
    /// first column's layout.
    pub fn combine_positional(cols: &[PartitionedValue], runner: &Runner) -> Result<Self> {
        let aligned = align_all(OpKind::Array, cols)?;
        Ok(Self::zip_rows(&aligned, runner, |row| {
            Scalar::Array(row.iter().map(|s| (*s).clone()).collect())
        }))
    }

    /// Row-wise combination of columns that already share one layout.
    pub(crate) fn zip_rows<F>(cols: &[PartitionedValue], runner: &Runner, f: F) -> Self
    where
        F: Fn(&[&Scalar]) -> Scalar + Send + Sync,
    {
        let Some(first) = cols.first() else {
            return Self::from_parts(Vec::new());
        };
        let parts = runner.run_indexed(first.partition_count(), |p| {
            let column_parts: Vec<&Partition> = cols.iter().map(|c| &c.partitions[p]).collect();
            let len = column_parts[0].len();
            let constants: Option<Vec<&Scalar>> =
                column_parts.iter().map(|part| part.constant_value()).collect();
            if let Some(row) = constants {
                return Partition::Constant { value: f(&row), len };
            }
            let mut out = Vec::with_capacity(len);
            let mut row: Vec<&Scalar> = Vec::with_capacity(column_parts.len());
            for r in 0..len {
                row.clear();
                row.extend(column_parts.iter().map(|part| part.row(r)));
                out.push(f(&row));
            }
            Partition::rows(out)
        });
        Self::from_parts(parts)
    }

    fn split_by(rows: Vec<Scalar>, layout: &Layout) -> Self {
        let mut it = rows.into_iter();
        let parts = layout
            .sizes()
            .iter()
            .map(|&n| Partition::rows(it.by_ref().take(n).collect()))
            .collect();
        Self::from_parts(parts)
    }

    fn uniform_constant(&self) -> Option<&Scalar> {
        let mut value = None;
        for part in &self.partitions {
            match part {
                Partition::Constant { value: v, .. } => match value {
                    None => value = Some(v),
                    Some(seen) if seen == v => {}
                    Some(_) => return None,
                },
                Partition::Rows(_) => return None,
            }
        }
        value
    }
}

/// Realign every column to the first column's layout.
pub(crate) fn align_all(kind: OpKind, cols: &[PartitionedValue]) -> Result<Vec<PartitionedValue>> {
    let Some(first) = cols.first() else {
        return Err(Error::EmptyOperand { kind });
    };
    let layout = first.layout();
    cols.iter().map(|c| c.realign(kind, &layout)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(xs: &[i64]) -> Vec<Scalar> {
        xs.iter().copied().map(Scalar::Int).collect()
    }

    #[test]
    fn even_layout_is_exact() {
        assert_eq!(Layout::even(5, 4).sizes(), &[2, 1, 1, 1]);
        assert_eq!(Layout::even(2, 4).sizes(), &[1, 1, 0, 0]);
        assert_eq!(Layout::even(3, 0).sizes(), &[3]);
        assert_eq!(Layout::even(9, 3).len(), 9);
    }

    #[test]
    fn constant_stays_lazy() {
        let c = PartitionedValue::materialize_constant(Scalar::Int(7), 10, 3);
        assert_eq!(c.len(), 10);
        assert_eq!(c.partition_count(), 3);
        assert!(c.partitions().iter().all(Partition::is_constant));
        assert!(c.iter().all(|s| *s == Scalar::Int(7)));
    }

    #[test]
    fn realign_moves_boundaries_only() {
        let v = PartitionedValue::from_partitions(vec![ints(&[1, 2, 3]), ints(&[4])]);
        let target = Layout::from_sizes(vec![1, 1, 2]);
        let r = v.realign(OpKind::Array, &target).unwrap();
        assert_eq!(r.layout(), target);
        assert_eq!(r.rows(), ints(&[1, 2, 3, 4]));

        let err = v.realign(OpKind::Array, &Layout::even(5, 1)).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: 5,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn zip_of_constants_is_constant() {
        let layout = Layout::even(4, 2);
        let a = PartitionedValue::constant(Scalar::Int(1), &layout);
        let b = PartitionedValue::constant(Scalar::from("x"), &layout);
        let out = PartitionedValue::combine_positional(&[a, b], &Runner::sequential()).unwrap();
        assert!(out.partitions().iter().all(Partition::is_constant));
        assert_eq!(out.rows()[3], Scalar::from(vec![Scalar::Int(1), Scalar::from("x")]));
    }

    #[test]
    fn filter_drops_false_and_null() {
        let v = PartitionedValue::from_partitions(vec![ints(&[1, 2]), ints(&[3])]);
        let mask = PartitionedValue::from_partitions(vec![vec![
            Scalar::Bool(true),
            Scalar::Null,
            Scalar::Bool(false),
        ]]);
        let out = v.filter(OpKind::ArrayCollect, &mask, &Runner::sequential()).unwrap();
        assert_eq!(out.to_partitions(), vec![ints(&[1]), vec![]]);
    }
}
