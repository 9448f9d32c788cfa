//! Plan compiler scenario tests
//!
//! End-to-end compilation through a session:
//! 1. Result column naming
//! 2. Composite index ranges and the lexicographic flag
//! 3. Parameter typing
//! 4. Resolution failures and feature gaps

use std::sync::Arc;

use sqlplan::catalog::{Catalog, DataType, Value};
use sqlplan::planner::{
    CompiledPlan, ErrorCategory, ExplainPlan, Generated, IndexKeyRange, Operator,
    PlannerErrorCode,
};
use sqlplan::session::Session;
use sqlplan::sql::{
    BinaryOp, ColumnDef, Expr, ObjectName, OrderByItem, SelectItem, SelectStatement, Statement,
    TableRef,
};

fn column(name: &str, data_type: DataType) -> ColumnDef {
    ColumnDef {
        name: name.into(),
        data_type,
        nullable: true,
        collation: None,
    }
}

/// `test.t(a bigint, b integer, c integer, s varchar en_us_ci)` with index
/// `abc` on `(a, b, c)` and `u(a bigint, d double)`
fn session() -> Session {
    let mut catalog = Catalog::new();
    catalog.create_schema("test").unwrap();
    let mut session = Session::new(Arc::new(catalog), "test");

    let ddl = [
        Statement::CreateTable {
            table: ObjectName::new("t"),
            columns: vec![
                column("a", DataType::BigInt),
                column("b", DataType::Integer),
                column("c", DataType::Integer),
                ColumnDef {
                    collation: Some("en_us_ci".into()),
                    ..column("s", DataType::Varchar)
                },
            ],
        },
        Statement::CreateIndex {
            name: "abc".into(),
            table: ObjectName::new("t"),
            columns: vec!["a".into(), "b".into(), "c".into()],
            unique: false,
        },
        Statement::CreateTable {
            table: ObjectName::new("u"),
            columns: vec![column("a", DataType::BigInt), column("d", DataType::Double)],
        },
    ];
    for statement in &ddl {
        session.execute_ddl(statement).unwrap();
    }
    session
}

fn compile(session: &Session, statement: &Statement) -> CompiledPlan {
    session
        .compile(statement, &[])
        .unwrap()
        .into_plan()
        .unwrap()
}

fn select_from(table: &str, columns: Vec<SelectItem>, predicate: Option<Expr>) -> Statement {
    Statement::Select(SelectStatement {
        columns,
        from: vec![TableRef::new(ObjectName::new(table))],
        where_clause: predicate,
        ..SelectStatement::default()
    })
}

fn index_range(op: &Operator) -> Option<&IndexKeyRange> {
    match op {
        Operator::IndexScan { range } => Some(range),
        other => other.inputs().into_iter().find_map(index_range),
    }
}

fn row(values: &[i64]) -> Expr {
    Expr::row(values.iter().map(|v| Expr::literal(*v)).collect())
}

fn abc() -> Expr {
    Expr::row(vec![Expr::column("a"), Expr::column("b"), Expr::column("c")])
}

fn names(plan: &CompiledPlan) -> Vec<&str> {
    plan.result_columns.iter().map(|c| c.name.as_str()).collect()
}

// =============================================================================
// RESULT COLUMN NAMING
// =============================================================================

#[test]
fn test_alias_and_declared_names() {
    let session = session();
    let plan = compile(
        &session,
        &select_from(
            "t",
            vec![
                SelectItem::aliased(Expr::column("a"), "x"),
                SelectItem::expr(Expr::column("B")),
                SelectItem::Expr {
                    expr: Expr::binary(BinaryOp::Plus, Expr::column("c"), Expr::literal(1)),
                    alias: None,
                    default_name: Some("EXPR$2".into()),
                },
                SelectItem::expr(Expr::binary(
                    BinaryOp::Multiply,
                    Expr::column("c"),
                    Expr::literal(2),
                )),
            ],
            None,
        ),
    );
    assert_eq!(names(&plan), vec!["x", "b", "EXPR$2", "c * 2"]);
    assert_eq!(plan.result_columns[0].data_type, Some(DataType::BigInt));
    assert_eq!(plan.result_columns[2].data_type, Some(DataType::BigInt));
}

#[test]
fn test_view_declared_column_names() {
    let mut session = session();
    session
        .execute_ddl(&Statement::CreateView {
            name: "v".into(),
            columns: vec!["p".into(), "q".into()],
            query: SelectStatement {
                columns: vec![
                    SelectItem::expr(Expr::column("a")),
                    SelectItem::expr(Expr::column("s")),
                ],
                from: vec![TableRef::new(ObjectName::new("t"))],
                ..SelectStatement::default()
            },
        })
        .unwrap();

    let plan = compile(
        &session,
        &Statement::Select(SelectStatement::star_from(ObjectName::new("v"))),
    );
    assert_eq!(names(&plan), vec!["p", "q"]);
    assert_eq!(plan.result_columns[1].data_type, Some(DataType::Varchar));
}

// =============================================================================
// COMPOSITE INDEX RANGES
// =============================================================================

#[test]
fn test_row_range_with_equal_prefix_is_not_lexicographic() {
    let session = session();
    let plan = compile(
        &session,
        &select_from(
            "t",
            vec![SelectItem::Wildcard],
            Some(Expr::between(abc(), row(&[1, 10, 800]), row(&[1, 10, 888]))),
        ),
    );

    let range = index_range(&plan.root).unwrap();
    assert_eq!(range.index().name, "abc");
    assert_eq!(range.bound_columns(), 3);
    assert!(!range.lexicographic());
    assert_eq!(range.to_string(), "(>= (1, 10, 800), <= (1, 10, 888))");
}

#[test]
fn test_row_range_with_differing_prefix_is_lexicographic() {
    let session = session();
    let plan = compile(
        &session,
        &select_from(
            "t",
            vec![SelectItem::Wildcard],
            Some(Expr::between(abc(), row(&[1, 10, 800]), row(&[1, 20, 888]))),
        ),
    );

    let range = index_range(&plan.root).unwrap();
    assert_eq!(range.bound_columns(), 3);
    assert!(range.lexicographic());
    assert!(plan
        .root
        .to_string()
        .contains("IndexScan(test.t.abc(a, b, c), (>= (1, 10, 800), <= (1, 20, 888)), lexicographic)"));
}

#[test]
fn test_equality_prefix_then_range() {
    let session = session();
    let predicate = Expr::and(
        Expr::eq(Expr::column("a"), Expr::literal(1)),
        Expr::binary(BinaryOp::Lt, Expr::column("b"), Expr::literal(5)),
    );
    let plan = compile(&session, &select_from("t", vec![SelectItem::Wildcard], Some(predicate)));

    let range = index_range(&plan.root).unwrap();
    assert_eq!(range.bound_columns(), 2);
    assert!(!range.lexicographic());
    assert_eq!(range.to_string(), "(, < (1, 5))");
}

#[test]
fn test_non_leading_predicate_scans_table() {
    let session = session();
    let plan = compile(
        &session,
        &select_from(
            "t",
            vec![SelectItem::Wildcard],
            Some(Expr::eq(Expr::column("b"), Expr::literal(3))),
        ),
    );
    assert!(index_range(&plan.root).is_none());
    assert!(plan.root.to_string().contains("TableScan(test.t)"));
}

// =============================================================================
// PARAMETERS
// =============================================================================

#[test]
fn test_parameter_types_from_context_and_hints() {
    let session = session();
    let statement = select_from(
        "t",
        vec![SelectItem::Wildcard],
        Some(Expr::and(
            Expr::eq(Expr::column("a"), Expr::param(0)),
            Expr::eq(Expr::column("s"), Expr::param(1)),
        )),
    );

    let plan = compile(&session, &statement);
    assert_eq!(
        plan.parameter_types,
        vec![Some(DataType::BigInt), Some(DataType::Varchar)]
    );

    let hinted = session
        .compile(&statement, &[Some(DataType::Integer)])
        .unwrap()
        .into_plan()
        .unwrap();
    assert_eq!(
        hinted.parameter_types,
        vec![Some(DataType::Integer), Some(DataType::Varchar)]
    );
}

#[test]
fn test_order_offset_limit() {
    let session = session();
    let plan = compile(
        &session,
        &Statement::Select(SelectStatement {
            columns: vec![SelectItem::expr(Expr::column("d"))],
            from: vec![TableRef::new(ObjectName::new("u"))],
            order_by: vec![OrderByItem {
                expr: Expr::column("d"),
                descending: true,
            }],
            offset: Some(5),
            limit: Some(10),
            ..SelectStatement::default()
        }),
    );
    assert_eq!(
        plan.root.to_string(),
        "Project(u.d)\n  Sort(u.d DESC)\n    TableScan(test.u)\n"
    );
    assert_eq!((plan.offset, plan.limit), (Some(5), Some(10)));
}

// =============================================================================
// FAILURES
// =============================================================================

#[test]
fn test_resolution_failures_carry_identifier() {
    let session = session();

    let err = session
        .compile(&select_from("missing", vec![SelectItem::Wildcard], None), &[])
        .unwrap_err();
    assert_eq!(err.code(), PlannerErrorCode::UnknownTable);
    assert_eq!(err.identifier(), Some("test.missing"));

    let err = session
        .compile(
            &Statement::Select(SelectStatement {
                columns: vec![SelectItem::expr(Expr::column("a"))],
                from: vec![
                    TableRef::new(ObjectName::new("t")),
                    TableRef::new(ObjectName::new("u")),
                ],
                ..SelectStatement::default()
            }),
            &[],
        )
        .unwrap_err();
    assert_eq!(err.code(), PlannerErrorCode::AmbiguousColumn);
    assert_eq!(err.category(), ErrorCategory::Resolution);
}

#[test]
fn test_out_of_range_parameter_index_rejected() {
    let session = session();
    for index in [usize::MAX, 1 << 40] {
        let err = session
            .compile(
                &select_from(
                    "t",
                    vec![SelectItem::Wildcard],
                    Some(Expr::eq(Expr::column("a"), Expr::param(index))),
                ),
                &[],
            )
            .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::InvalidStatement);
        assert!(err.message().contains("exceeds the limit"));
    }
}

#[test]
fn test_type_mismatch_in_predicate() {
    let session = session();
    let err = session
        .compile(
            &select_from(
                "t",
                vec![SelectItem::Wildcard],
                Some(Expr::eq(Expr::column("s"), Expr::literal(Value::Int(1)))),
            ),
            &[],
        )
        .unwrap_err();
    assert_eq!(err.code(), PlannerErrorCode::TypeMismatch);
}

#[test]
fn test_alter_table_is_feature_gap() {
    let session = session();
    let err = session
        .compile(
            &Statement::AlterTable {
                table: ObjectName::new("t"),
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(err.code(), PlannerErrorCode::Unsupported);
    assert_eq!(err.category(), ErrorCategory::FeatureGap);
    assert_eq!(err.to_string(), "[REJECT] PLAN_UNSUPPORTED: ALTER TABLE t not supported yet");

    let explain = ExplainPlan::from_error(&err);
    assert!(!explain.accepted());
}

#[test]
fn test_ddl_is_not_applicable() {
    let session = session();
    let generated = session
        .compile(&Statement::DropTable { table: ObjectName::new("u") }, &[])
        .unwrap();
    assert!(matches!(generated, Generated::NotApplicable));
}
