//! Assertion functions for evaluated values.
//!
//! Each assertion panics with the full expected and actual contents so a
//! failing test shows what went wrong without extra printing.

use std::collections::BTreeMap;

use crate::partitioned::PartitionedValue;
use crate::value::{Scalar, Value};

fn expect_partitioned(actual: &Value) -> &PartitionedValue {
    match actual {
        Value::Partitioned(p) => p,
        other => panic!("Expected a partitioned value, got {other:?}"),
    }
}

/// Assert that `actual` is a partitioned value with exactly these rows, in order.
///
/// # Panics
///
/// Panics if `actual` is not partitioned or its rows differ.
///
/// # Example
///
/// ```
/// use arrayflow::testing::{assert_rows_eq, int_column};
/// use arrayflow::{Scalar, Value};
///
/// let v = Value::Partitioned(int_column(vec![vec![1], vec![2]]));
/// assert_rows_eq(&v, &[Scalar::Int(1), Scalar::Int(2)]);
/// ```
pub fn assert_rows_eq(actual: &Value, expected: &[Scalar]) {
    let rows = expect_partitioned(actual).rows();
    assert_eq!(
        rows.len(),
        expected.len(),
        "Row count mismatch:\n  Expected: {expected:?}\n  Actual: {rows:?}"
    );
    for (i, (a, e)) in rows.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Row mismatch at index {i}:\n  Expected: {e}\n  Actual: {a}\n  Full actual: {rows:?}"
        );
    }
}

/// Assert per-partition contents, which also pins the layout.
///
/// # Panics
///
/// Panics if `actual` is not partitioned or any partition differs.
pub fn assert_partitions_eq(actual: &Value, expected: &[Vec<Scalar>]) {
    let parts = expect_partitioned(actual).to_partitions();
    assert_eq!(
        parts.as_slice(),
        expected,
        "Partition mismatch:\n  Expected: {expected:?}\n  Actual: {parts:?}"
    );
}

/// Assert that `actual` is exactly this scalar.
///
/// # Panics
///
/// Panics if `actual` is not a scalar or differs.
pub fn assert_scalar_eq(actual: &Value, expected: &Scalar) {
    match actual {
        Value::Scalar(s) => assert_eq!(s, expected, "Scalar mismatch:\n  Expected: {expected}\n  Actual: {s}"),
        other => panic!("Expected scalar {expected}, got {other:?}"),
    }
}

/// Assert that two element lists hold the same multiset of elements.
///
/// # Panics
///
/// Panics if some element occurs a different number of times.
///
/// # Example
///
/// ```
/// use arrayflow::testing::assert_same_elements;
/// use arrayflow::Scalar;
///
/// assert_same_elements(&[Scalar::Int(2), Scalar::Int(1)], &[Scalar::Int(1), Scalar::Int(2)]);
/// ```
pub fn assert_same_elements(actual: &[Scalar], expected: &[Scalar]) {
    fn counts(xs: &[Scalar]) -> BTreeMap<&Scalar, usize> {
        let mut m = BTreeMap::new();
        for x in xs {
            *m.entry(x).or_insert(0) += 1;
        }
        m
    }
    let (a, e) = (counts(actual), counts(expected));
    if a != e {
        panic!(
            "Element multiset mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}
