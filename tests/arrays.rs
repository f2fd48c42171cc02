use anyhow::Result;
use arrayflow::testing::*;
use arrayflow::*;

fn executor() -> Result<Executor> {
    Ok(Executor::new(&ExecConfig::sequential())?)
}

fn parallel_executor() -> Result<Executor> {
    let cfg = ExecConfig {
        mode: ExecMode::Parallel { threads: None },
        default_partitions: 4,
    };
    Ok(Executor::new(&cfg)?)
}

#[test]
fn array_from_three_columns() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new()
        .with("a", column(vec![vec![1i64, 2, 3]]))
        .with("b", column(vec![vec!["x", "y", "z"]]))
        .with("c", column(vec![vec![true, false, true]]));

    let e = Expr::array(vec![Expr::col("a"), Expr::col("b"), Expr::col("c")]);
    let out = exec.execute(&e, &scope, None)?;

    assert_rows_eq(
        &out,
        &[
            Scalar::from(vec![Scalar::Int(1), "x".into(), true.into()]),
            Scalar::from(vec![Scalar::Int(2), "y".into(), false.into()]),
            Scalar::from(vec![Scalar::Int(3), "z".into(), true.into()]),
        ],
    );
    Ok(())
}

#[test]
fn array_broadcasts_scalars_over_first_column_layout() -> Result<()> {
    let exec = parallel_executor()?;
    let scope = Scope::new().with("a", int_column(vec![vec![1, 2], vec![], vec![3]]));

    let e = Expr::array(vec![Expr::lit("k"), Expr::col("a"), Expr::lit(0i64)]);
    let out = exec.execute(&e, &scope, None)?;

    let k = Scalar::from("k");
    let row = |n: i64| Scalar::from(vec![k.clone(), Scalar::Int(n), Scalar::Int(0)]);
    assert_partitions_eq(&out, &[vec![row(1), row(2)], vec![], vec![row(3)]]);
    Ok(())
}

#[test]
fn array_of_only_scalars_is_rejected() -> Result<()> {
    let exec = executor()?;
    let e = Expr::array(vec![Expr::lit(1i64), Expr::lit(2i64)]);
    let err = exec.execute(&e, &Scope::new(), None).unwrap_err();
    assert!(matches!(err, Error::EmptyOperand { kind: OpKind::Array }));
    Ok(())
}

#[test]
fn array_realigns_differently_partitioned_columns() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new()
        .with("a", int_column(vec![vec![1, 2, 3, 4]]))
        .with("b", sequence_column(4, 3));

    let out = exec.execute(
        &Expr::array(vec![Expr::col("a"), Expr::col("b")]),
        &scope,
        None,
    )?;
    let p = out.as_partitioned().expect("partitioned");
    assert_eq!(p.partition_count(), 1);
    assert_eq!(p.rows()[3], int_array(&[4, 3]));
    Ok(())
}

#[test]
fn array_rejects_unequal_lengths() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new()
        .with("a", sequence_column(3, 1))
        .with("b", sequence_column(2, 1));
    let err = exec
        .execute(&Expr::array(vec![Expr::col("a"), Expr::col("b")]), &scope, None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ShapeMismatch {
            kind: OpKind::Array,
            expected: 3,
            found: 2
        }
    ));
    Ok(())
}

#[test]
fn length_of_constructed_array_is_its_width() -> Result<()> {
    let exec = parallel_executor()?;
    let scope = Scope::new()
        .with("a", sequence_column(50, 4))
        .with("b", sequence_column(50, 4));

    let e = Expr::array(vec![Expr::col("a"), Expr::col("b"), Expr::lit("z")]).length();
    let out = exec.execute(&e, &scope, None)?;
    assert_rows_eq(&out, &vec![Scalar::Int(3); 50]);
    Ok(())
}

#[test]
fn length_marks_missing_rows() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new().with(
        "xs",
        int_array_column(vec![vec![Some(vec![1, 2]), None], vec![Some(vec![])]]),
    );
    let out = exec.execute(&Expr::col("xs").length(), &scope, None)?;
    assert_partitions_eq(
        &out,
        &[vec![Scalar::Int(2), Scalar::Null], vec![Scalar::Int(0)]],
    );
    Ok(())
}

#[test]
fn index_out_of_bounds_is_null_not_error() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new().with(
        "xs",
        int_array_column(vec![vec![Some(vec![1, 2, 3]), Some(vec![4, 5, 6])]]),
    );
    let out = exec.execute(&Expr::col("xs").index(5), &scope, None)?;
    assert_rows_eq(&out, &[Scalar::Null, Scalar::Null]);
    Ok(())
}

#[test]
fn index_is_total_over_mixed_rows() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new().with(
        "xs",
        int_array_column(vec![
            vec![Some(vec![1, 2, 3]), None],
            vec![Some(vec![]), Some(vec![9])],
        ]),
    );
    for index in [-4i64, -1, 0, 1, 2, 3, i64::MAX] {
        let out = exec.execute(&Expr::col("xs").index(index), &scope, None)?;
        assert_eq!(out.as_partitioned().map(PartitionedValue::len), Some(4));
    }
    let out = exec.execute(&Expr::col("xs").index(-1), &scope, None)?;
    assert_rows_eq(
        &out,
        &[Scalar::Int(3), Scalar::Null, Scalar::Null, Scalar::Int(9)],
    );
    Ok(())
}

#[test]
fn scalar_rules_cover_literals() -> Result<()> {
    let exec = executor()?;
    let lit = Expr::lit(vec![5i64, 6, 7]);
    let len = exec.execute(&lit.clone().length(), &Scope::new(), None)?;
    assert_scalar_eq(&len, &Scalar::Int(3));
    let elem = exec.execute(&lit.index(-2), &Scope::new(), None)?;
    assert_scalar_eq(&elem, &Scalar::Int(6));
    Ok(())
}

#[test]
fn concat_joins_rows_in_argument_order() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new()
        .with(
            "a",
            int_array_column(vec![vec![Some(vec![1]), Some(vec![2, 3])]]),
        )
        .with("b", int_array_column(vec![vec![Some(vec![10]), None]]));

    let e = Expr::concat(vec![Expr::col("a"), Expr::col("b"), Expr::lit(vec![0i64])]);
    let out = exec.execute(&e, &scope, None)?;
    assert_rows_eq(&out, &[int_array(&[1, 10, 0]), Scalar::Null]);
    Ok(())
}

#[test]
fn concat_is_associative() -> Result<()> {
    let exec = parallel_executor()?;
    let scope = Scope::new()
        .with(
            "a",
            int_array_column(vec![vec![Some(vec![1]), Some(vec![])], vec![Some(vec![2])]]),
        )
        .with(
            "b",
            int_array_column(vec![vec![Some(vec![3, 4]), Some(vec![5]), Some(vec![])]]),
        )
        .with(
            "c",
            int_array_column(vec![vec![Some(vec![6])], vec![Some(vec![7]), Some(vec![8])]]),
        );

    let nested = Expr::concat(vec![
        Expr::concat(vec![Expr::col("a"), Expr::col("b")]),
        Expr::col("c"),
    ]);
    let flat = Expr::concat(vec![Expr::col("a"), Expr::col("b"), Expr::col("c")]);

    let nested = exec.execute(&nested, &scope, None)?;
    let flat = exec.execute(&flat, &scope, None)?;
    let flat_rows = flat
        .as_partitioned()
        .map(PartitionedValue::rows)
        .unwrap_or_default();
    assert_rows_eq(&nested, &flat_rows);
    assert_eq!(flat_rows[0], int_array(&[1, 3, 4, 6]));
    assert_eq!(flat_rows[2], int_array(&[2, 8]));
    Ok(())
}

#[test]
fn concat_of_literals_stays_scalar() -> Result<()> {
    let exec = executor()?;
    let e = Expr::concat(vec![Expr::lit(vec![1i64]), Expr::lit(vec![2i64, 3])]);
    let out = exec.execute(&e, &Scope::new(), None)?;
    assert_scalar_eq(&out, &int_array(&[1, 2, 3]));
    Ok(())
}

#[test]
fn concat_length_mismatch_is_fatal() -> Result<()> {
    let exec = executor()?;
    let scope = Scope::new()
        .with(
            "a",
            int_array_column(vec![vec![Some(vec![1]), Some(vec![2])]]),
        )
        .with("b", int_array_column(vec![vec![Some(vec![3])]]));
    let err = exec
        .execute(&Expr::concat(vec![Expr::col("a"), Expr::col("b")]), &scope, None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ShapeMismatch {
            kind: OpKind::ArrayConcat,
            ..
        }
    ));
    Ok(())
}

#[test]
fn errors_from_children_propagate() -> Result<()> {
    let exec = executor()?;
    let e = Expr::concat(vec![Expr::col("nope")]);
    let err = exec.execute(&e, &Scope::new(), None).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn(_)));
    Ok(())
}
