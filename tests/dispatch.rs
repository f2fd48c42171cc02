use std::sync::Arc;

use anyhow::Result;
use arrayflow::testing::*;
use arrayflow::*;

fn lengths_per_group(s: &Session<'_>, args: Vec<Arg>) -> arrayflow::Result<Value> {
    let kind = OpKind::ArrayLength;
    let grouped = args
        .into_iter()
        .next()
        .ok_or(Error::EmptyOperand { kind })?
        .into_grouped(kind)?;
    Ok(grouped.agg(s.runner(), &Count).into())
}

#[test]
fn resolve_is_stable_for_equal_tags() -> Result<()> {
    let registry = Registry::with_array_rules()?;
    let tags = [ArgTag::Partitioned, ArgTag::Int];
    let a = registry.resolve(OpKind::ArrayIndex, &tags)?;
    let b = registry.resolve(OpKind::ArrayIndex, &tags)?;
    assert!(Arc::ptr_eq(&a, &b));
    Ok(())
}

#[test]
fn rules_can_be_added_for_new_shapes() -> Result<()> {
    let registry = Arc::new(Registry::with_array_rules()?);
    let exec = Executor::with_registry(Arc::clone(&registry), Runner::sequential());

    let data = int_column(vec![vec![1, 2, 3], vec![4]]);
    let keys = column(vec![vec!["x", "y", "x"], vec!["x"]]);
    let scope = Scope::new().with("g", data.group_by(&keys, exec.runner())?);

    let err = exec
        .execute(&Expr::col("g").length(), &scope, None)
        .unwrap_err();
    assert!(matches!(err, Error::Dispatch { kind: OpKind::ArrayLength, .. }));

    registry.register(
        OpKind::ArrayLength,
        Pattern::exact(&[ArgTag::Grouped]),
        lengths_per_group,
    )?;
    let out = exec.execute(&Expr::col("g").length(), &scope, None)?;
    assert_rows_eq(&out, &[Scalar::Int(3), Scalar::Int(1)]);
    Ok(())
}

#[test]
fn exact_pattern_beats_widening_one() -> Result<()> {
    let registry = Registry::with_array_rules()?;
    registry.register(
        OpKind::ArrayLength,
        Pattern::exact(&[ArgTag::Null]),
        |_: &Session<'_>, _: Vec<Arg>| Ok(Value::Scalar(Scalar::Int(0))),
    )?;
    let exec = Executor::with_registry(Arc::new(registry), Runner::sequential());

    let out = exec.execute(&Expr::lit(Scalar::Null).length(), &Scope::new(), None)?;
    assert_scalar_eq(&out, &Scalar::Int(0));
    // Other scalars still go through the built-in rule.
    let out = exec.execute(&Expr::lit(vec![1i64, 2]).length(), &Scope::new(), None)?;
    assert_scalar_eq(&out, &Scalar::Int(2));
    Ok(())
}

#[test]
fn registering_a_builtin_pattern_again_fails() -> Result<()> {
    let registry = Registry::with_array_rules()?;
    let before = registry.len();
    let err = registry
        .register(
            OpKind::ArrayConcat,
            Pattern::variadic(Slot::Columnar),
            |_: &Session<'_>, _: Vec<Arg>| Ok(Value::Scalar(Scalar::Null)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateRule {
            kind: OpKind::ArrayConcat,
            ..
        }
    ));
    assert_eq!(registry.len(), before);
    Ok(())
}

#[test]
fn unregistered_shapes_report_their_signature() -> Result<()> {
    let exec = Executor::new(&ExecConfig::sequential())?;
    // A float index has no rule.
    let err = exec
        .registry()
        .resolve(OpKind::ArrayIndex, &[ArgTag::Partitioned, ArgTag::Float])
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert_eq!(
        err,
        "no rule registered for ArrayIndex with arguments (partitioned, float)"
    );
    Ok(())
}

#[test]
fn builtin_patterns_are_listed_per_kind() -> Result<()> {
    let registry = Registry::with_array_rules()?;
    assert_eq!(registry.patterns(OpKind::ArrayCollect).len(), 3);
    let shown: Vec<String> = registry
        .patterns(OpKind::ArrayConcat)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(shown, ["(exprs)", "(<columnar>...)"]);
    Ok(())
}
