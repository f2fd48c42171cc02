//! Columns grouped by key, partition by partition.
//!
//! Grouping is applied upstream of the array rules: a [`GroupedValue`] keeps
//! its source partitioning and, inside each partition, maps every key to the
//! rows that carried it in arrival order. Aggregating a grouped value runs the
//! chunk phase per (partition, key) and the combine phase per key across
//! partitions, in partition order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::aggregate::Aggregation;
use crate::error::{Error, Result};
use crate::partitioned::PartitionedValue;
use crate::runner::Runner;
use crate::value::Scalar;

type Groups = BTreeMap<Scalar, Vec<Scalar>>;

#[derive(Clone, Debug)]
pub struct GroupedValue {
    partitions: Vec<Arc<Groups>>,
}

impl GroupedValue {
    /// Group `data` by the row-aligned `keys` column.
    pub fn new(data: &PartitionedValue, keys: &PartitionedValue, runner: &Runner) -> Result<Self> {
        if keys.len() != data.len() {
            return Err(Error::KeyLengthMismatch {
                expected: data.len(),
                found: keys.len(),
            });
        }
        let keys = keys.realigned(&data.layout());
        let partitions = runner.run_indexed(data.partition_count(), |i| {
            let mut groups = Groups::new();
            for (k, v) in keys.partitions()[i].iter().zip(data.partitions()[i].iter()) {
                groups.entry(k.clone()).or_default().push(v.clone());
            }
            Arc::new(groups)
        });
        Ok(Self { partitions })
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Distinct keys, ascending.
    pub fn keys(&self) -> Vec<Scalar> {
        let keys: BTreeSet<&Scalar> = self.partitions.iter().flat_map(|g| g.keys()).collect();
        keys.into_iter().cloned().collect()
    }

    pub fn group_count(&self) -> usize {
        self.keys().len()
    }

    /// One `(key, result)` pair per key, keys ascending.
    pub fn agg_by_key(&self, runner: &Runner, agg: &dyn Aggregation) -> Vec<(Scalar, Scalar)> {
        let chunked = runner.run_indexed(self.partitions.len(), |i| {
            self.partitions[i]
                .iter()
                .map(|(k, rows)| (k.clone(), agg.chunk(rows)))
                .collect::<Vec<_>>()
        });
        let mut per_key: BTreeMap<Scalar, Vec<Scalar>> = BTreeMap::new();
        for part in chunked {
            for (k, chunk) in part {
                per_key.entry(k).or_default().push(chunk);
            }
        }
        per_key
            .into_iter()
            .map(|(k, chunks)| (k, agg.combine(chunks)))
            .collect()
    }

    /// Per-group results as a single-partition column ordered like [`keys`](Self::keys).
    pub fn agg(&self, runner: &Runner, agg: &dyn Aggregation) -> PartitionedValue {
        let rows = self
            .agg_by_key(runner, agg)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        PartitionedValue::from_partitions(vec![rows])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{CollectList, Count};

    fn col(parts: Vec<Vec<i64>>) -> PartitionedValue {
        PartitionedValue::from_partitions(
            parts
                .into_iter()
                .map(|p| p.into_iter().map(Scalar::Int).collect())
                .collect(),
        )
    }

    #[test]
    fn groups_follow_partition_then_arrival_order() {
        let data = col(vec![vec![1, 2, 3], vec![4, 5]]);
        let keys = PartitionedValue::from_rows(
            vec!["b", "a", "b", "a", "b"].into_iter().map(Scalar::from).collect(),
            1,
        );
        let g = GroupedValue::new(&data, &keys, &Runner::sequential()).unwrap();
        assert_eq!(g.partition_count(), 2);
        assert_eq!(g.keys(), vec![Scalar::from("a"), Scalar::from("b")]);

        let out = g.agg_by_key(&Runner::sequential(), &CollectList);
        assert_eq!(
            out,
            vec![
                (Scalar::from("a"), Scalar::from(vec![2i64, 4])),
                (Scalar::from("b"), Scalar::from(vec![1i64, 3, 5])),
            ]
        );
        assert_eq!(
            g.agg(&Runner::sequential(), &Count).rows(),
            vec![Scalar::Int(2), Scalar::Int(3)]
        );
    }

    #[test]
    fn key_length_must_match() {
        let data = col(vec![vec![1, 2]]);
        let keys = col(vec![vec![1]]);
        let err = GroupedValue::new(&data, &keys, &Runner::sequential()).unwrap_err();
        assert!(matches!(
            err,
            Error::KeyLengthMismatch {
                expected: 2,
                found: 1
            }
        ));
    }
}
