//! Built-in rules for array operations.
//!
//! | kind           | pattern                          | rule                              |
//! |----------------|----------------------------------|-----------------------------------|
//! | `ArrayLength`  | `(partitioned)`                  | per-row length                    |
//! | `ArrayLength`  | `(<scalar>)`                     | length of a literal               |
//! | `ArrayIndex`   | `(partitioned, int)`             | per-row element                   |
//! | `ArrayIndex`   | `(<scalar>, int)`                | element of a literal              |
//! | `Array`        | `(exprs)`                        | evaluate, broadcast, stack rows   |
//! | `ArrayConcat`  | `(exprs)`                        | evaluate, then re-dispatch        |
//! | `ArrayConcat`  | `(<columnar>...)`                | per-row concatenation             |
//! | `ArrayCollect` | `(partitioned, absent)`          | `collect_list` in the agg context |
//! | `ArrayCollect` | `(partitioned, partitioned)`     | as above, masked rows left out    |
//! | `ArrayCollect` | `(grouped, absent)`              | `collect_list` per group          |
//!
//! Row-level problems never fail a rule: a missing array, a non-array row or
//! an out-of-bounds index all produce `Scalar::Null` for that row.

use tracing::trace;

use crate::aggregate::CollectList;
use crate::broadcast;
use crate::dispatch::Registry;
use crate::error::{Error, Result};
use crate::executor::Session;
use crate::expr::OpKind;
use crate::partitioned::PartitionedValue;
use crate::type_tag::{signature, ArgTag, Pattern, Slot};
use crate::value::{Arg, Scalar, Value};

/// Register every built-in array rule.
pub fn register(registry: &Registry) -> Result<()> {
    use ArgTag::{Absent, Exprs, Grouped, Int, Partitioned};

    registry.register(
        OpKind::ArrayLength,
        Pattern::exact(&[Partitioned]),
        execute_array_length,
    )?;
    registry.register(
        OpKind::ArrayLength,
        Pattern::new(vec![Slot::Scalar]),
        execute_array_length_scalar,
    )?;
    registry.register(
        OpKind::ArrayIndex,
        Pattern::exact(&[Partitioned, Int]),
        execute_array_index,
    )?;
    registry.register(
        OpKind::ArrayIndex,
        Pattern::new(vec![Slot::Scalar, Slot::Is(Int)]),
        execute_array_index_scalar,
    )?;
    registry.register(OpKind::Array, Pattern::exact(&[Exprs]), execute_array_column)?;
    registry.register(
        OpKind::ArrayConcat,
        Pattern::exact(&[Exprs]),
        execute_array_concat_exprs,
    )?;
    registry.register(
        OpKind::ArrayConcat,
        Pattern::variadic(Slot::Columnar),
        execute_array_concat,
    )?;
    registry.register(
        OpKind::ArrayCollect,
        Pattern::exact(&[Partitioned, Absent]),
        execute_array_collect,
    )?;
    registry.register(
        OpKind::ArrayCollect,
        Pattern::exact(&[Partitioned, Partitioned]),
        execute_array_collect_filtered,
    )?;
    registry.register(
        OpKind::ArrayCollect,
        Pattern::exact(&[Grouped, Absent]),
        execute_array_collect_grouped,
    )?;
    Ok(())
}

/* ===================== row helpers ===================== */

/// Element count of an array row; `Null` for anything else.
pub fn array_length(row: &Scalar) -> Scalar {
    match row {
        Scalar::Array(items) => Scalar::Int(items.len() as i64),
        _ => Scalar::Null,
    }
}

/// `row[index]`, counting negative indexes from the end; `Null` when out of bounds.
pub fn array_index(row: &Scalar, index: i64) -> Scalar {
    let Scalar::Array(items) = row else {
        return Scalar::Null;
    };
    let len = items.len() as i64;
    let i = if index < 0 { index + len } else { index };
    if (0..len).contains(&i) {
        items[i as usize].clone()
    } else {
        Scalar::Null
    }
}

/// Concatenate array rows in order; `Null` if any of them is not an array.
pub fn array_concat(row: &[&Scalar]) -> Scalar {
    let mut out = Vec::new();
    for item in row {
        match item {
            Scalar::Array(items) => out.extend(items.iter().cloned()),
            _ => return Scalar::Null,
        }
    }
    Scalar::Array(out)
}

/// Destructure exactly `N` arguments.
fn take<const N: usize>(kind: OpKind, args: Vec<Arg>) -> Result<[Arg; N]> {
    args.try_into().map_err(|args: Vec<Arg>| {
        let tags: Vec<ArgTag> = args.iter().map(Arg::tag).collect();
        Error::Dispatch {
            kind,
            signature: signature(&tags),
        }
    })
}

/* ===================== ArrayLength / ArrayIndex ===================== */

fn execute_array_length(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let [data] = take::<1>(OpKind::ArrayLength, args)?;
    let data = data.into_partitioned(OpKind::ArrayLength)?;
    Ok(data.map_rows(s.runner(), array_length).into())
}

fn execute_array_length_scalar(_: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let [data] = take::<1>(OpKind::ArrayLength, args)?;
    Ok(Value::Scalar(array_length(&data.into_scalar(OpKind::ArrayLength)?)))
}

fn index_arg(arg: Arg) -> Result<i64> {
    match arg {
        Arg::Scalar(Scalar::Int(i)) => Ok(i),
        other => Err(Error::UnexpectedOperand {
            kind: OpKind::ArrayIndex,
            found: other.tag(),
        }),
    }
}

fn execute_array_index(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let [data, index] = take::<2>(OpKind::ArrayIndex, args)?;
    let data = data.into_partitioned(OpKind::ArrayIndex)?;
    let index = index_arg(index)?;
    Ok(data.map_rows(s.runner(), move |row| array_index(row, index)).into())
}

fn execute_array_index_scalar(_: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let [data, index] = take::<2>(OpKind::ArrayIndex, args)?;
    let data = data.into_scalar(OpKind::ArrayIndex)?;
    Ok(Value::Scalar(array_index(&data, index_arg(index)?)))
}

/* ===================== Array ===================== */

fn execute_array_column(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let [items] = take::<1>(OpKind::Array, args)?;
    let items = items.into_exprs(OpKind::Array)?;
    let values = items
        .iter()
        .map(|e| s.execute(e))
        .collect::<Result<Vec<_>>>()?;
    trace!(columns = values.len(), "building array column");
    let cols = broadcast::reconcile(OpKind::Array, values)?;
    Ok(PartitionedValue::combine_positional(&cols, s.runner())?.into())
}

/* ===================== ArrayConcat ===================== */

fn execute_array_concat_exprs(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let [items] = take::<1>(OpKind::ArrayConcat, args)?;
    let values = items
        .into_exprs(OpKind::ArrayConcat)?
        .iter()
        .map(|e| s.execute(e).map(Arg::from))
        .collect::<Result<Vec<_>>>()?;
    s.dispatch(OpKind::ArrayConcat, values)
}

fn execute_array_concat(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let kind = OpKind::ArrayConcat;
    let values = args
        .into_iter()
        .map(|a| a.into_value(kind))
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(Error::EmptyOperand { kind });
    }
    if values.iter().all(|v| matches!(v, Value::Scalar(_))) {
        let row: Vec<&Scalar> = values.iter().filter_map(Value::as_scalar).collect();
        return Ok(Value::Scalar(array_concat(&row)));
    }
    let cols = broadcast::reconcile(kind, values)?;
    Ok(PartitionedValue::zip_rows(&cols, s.runner(), array_concat).into())
}

/* ===================== ArrayCollect ===================== */

fn execute_array_collect(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let kind = OpKind::ArrayCollect;
    let [data, _] = take::<2>(kind, args)?;
    let data = data.into_partitioned(kind)?;
    s.aggcontext(kind)?.agg(s.runner(), &data, &CollectList)
}

fn execute_array_collect_filtered(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let kind = OpKind::ArrayCollect;
    let [data, mask] = take::<2>(kind, args)?;
    let data = data.into_partitioned(kind)?;
    let mask = mask.into_partitioned(kind)?;
    s.aggcontext(kind)?
        .agg_where(kind, s.runner(), &data, &mask, &CollectList)
}

fn execute_array_collect_grouped(s: &Session<'_>, args: Vec<Arg>) -> Result<Value> {
    let kind = OpKind::ArrayCollect;
    let [data, _] = take::<2>(kind, args)?;
    let data = data.into_grouped(kind)?;
    Ok(data.agg(s.runner(), &CollectList).into())
}
