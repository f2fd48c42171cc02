//! Column fixtures built from plain Rust values.

use crate::partitioned::PartitionedValue;
use crate::value::Scalar;

/// Build a column from explicit partitions of anything convertible to [`Scalar`].
///
/// ```
/// use arrayflow::testing::column;
///
/// let c = column(vec![vec!["a", "b"], vec!["c"]]);
/// assert_eq!(c.partition_count(), 2);
/// assert_eq!(c.len(), 3);
/// ```
#[must_use]
pub fn column<T: Into<Scalar>>(parts: Vec<Vec<T>>) -> PartitionedValue {
    PartitionedValue::from_partitions(
        parts
            .into_iter()
            .map(|p| p.into_iter().map(Into::into).collect())
            .collect(),
    )
}

#[must_use]
pub fn int_column(parts: Vec<Vec<i64>>) -> PartitionedValue {
    column(parts)
}

/// A column whose rows are integer arrays; `None` rows are missing.
#[must_use]
pub fn int_array_column(parts: Vec<Vec<Option<Vec<i64>>>>) -> PartitionedValue {
    column(parts)
}

/// Shorthand for an integer array scalar.
#[must_use]
pub fn int_array(xs: &[i64]) -> Scalar {
    Scalar::from(xs.to_vec())
}

/// `n` rows `0..n` split evenly over `partitions` partitions.
#[must_use]
pub fn sequence_column(n: i64, partitions: usize) -> PartitionedValue {
    PartitionedValue::from_rows((0..n).map(Scalar::Int).collect(), partitions)
}
