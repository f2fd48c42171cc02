//! Broadcast reconciliation of mixed scalar/partitioned operands.
//!
//! Rules that combine operands row by row need every operand as a column with
//! one shared layout. The first partitioned operand fixes that layout:
//! - partitioned operands of the same length are realigned to it (a no-op when
//!   they already share it), any other length is a shape mismatch;
//! - scalars become lazy constant columns over it.
//!
//! With no partitioned operand there is no shape to broadcast to and
//! reconciliation fails with [`Error::EmptyOperand`].

use crate::error::{Error, Result};
use crate::expr::OpKind;
use crate::partitioned::PartitionedValue;
use crate::type_tag::ArgTag;
use crate::value::Value;

/// Turn `values` into columns sharing the first partitioned operand's layout.
pub fn reconcile(kind: OpKind, values: Vec<Value>) -> Result<Vec<PartitionedValue>> {
    let layout = values
        .iter()
        .find_map(Value::as_partitioned)
        .map(PartitionedValue::layout)
        .ok_or(Error::EmptyOperand { kind })?;

    values
        .into_iter()
        .map(|v| match v {
            Value::Partitioned(p) => p.realign(kind, &layout),
            Value::Scalar(s) => Ok(PartitionedValue::constant(s, &layout)),
            Value::Grouped(_) => Err(Error::UnexpectedOperand {
                kind,
                found: ArgTag::Grouped,
            }),
        })
        .collect()
}
