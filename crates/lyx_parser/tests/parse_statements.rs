use insta::assert_debug_snapshot;
use lyx_parser::ast::{AExpr, Delete, FromClauseNode, JoinExpr, RangeVar, Select, VarSet, VarType};
use lyx_parser::parser::{parse, parse_one};
use lyx_parser::statement::Statement;
use pretty_assertions::assert_eq;

#[test]
fn select_join_with_predicate() {
    let got = parse_one("SELECT * FROM a JOIN b ON a.id = b.id WHERE a.x = 1").unwrap();
    let expected = Statement::Select(Select {
        from_clause: vec![JoinExpr::new(RangeVar::relation("a"), RangeVar::relation("b")).into()],
        where_clause: AExpr::op("=", AExpr::column("a.x"), AExpr::literal("1")),
    });
    assert_eq!(expected, got);
}

#[test]
fn set_local() {
    assert_debug_snapshot!(parse("SET LOCAL statement_timeout = '5s'").unwrap(), @r###"
    [
        VarSet(
            VarSet {
                is_local: true,
                var_type: Set,
                name: "statement_timeout",
                value: "5s",
            },
        ),
    ]
    "###);

    let expected = Statement::VarSet(VarSet {
        is_local: true,
        var_type: VarType::Set,
        name: "statement_timeout".to_string(),
        value: "5s".to_string(),
    });
    assert_eq!(expected, parse_one("set local statement_timeout to '5s';").unwrap());
}

#[test]
fn delete_without_where() {
    assert_debug_snapshot!(parse("DELETE FROM t").unwrap(), @r###"
    [
        Delete(
            Delete {
                table_ref: RangeVar(
                    RangeVar {
                        schema_name: "",
                        relation_name: "t",
                        alias: "",
                    },
                ),
                where_clause: Empty,
            },
        ),
    ]
    "###);

    let expected = Statement::Delete(Delete {
        table_ref: RangeVar::relation("t").into(),
        where_clause: AExpr::Empty,
    });
    assert_eq!(expected, parse_one("delete from T").unwrap());
}

#[test]
fn nested_join_shape_follows_operand_order() {
    let got = parse_one("SELECT 1 FROM x.t1 AS a JOIN (t2 JOIN t3 ON t2.k = t3.k) AS j ON a.k = j.k")
        .unwrap();
    let Statement::Select(select) = got else {
        panic!("expected select");
    };

    let expected: FromClauseNode = JoinExpr::new(
        RangeVar::new("x", "t1").with_alias("a"),
        JoinExpr::new(RangeVar::relation("t2"), RangeVar::relation("t3")).with_alias("j"),
    )
    .into();
    assert_eq!(vec![expected], select.from_clause);
}

#[test]
fn block_comments_are_whitespace() {
    let got =
        parse_one("/* app: web */ SELECT * FROM t /* x */ WHERE id /* y */ = 1 -- done").unwrap();
    let expected = Statement::Select(Select {
        from_clause: vec![RangeVar::relation("t").into()],
        where_clause: AExpr::op("=", AExpr::column("id"), AExpr::literal("1")),
    });
    assert_eq!(expected, got);
}

#[test]
fn string_literals_are_distinct_from_numbers() {
    let Statement::Select(select) = parse_one("SELECT * FROM t WHERE id = '7' AND n = 7").unwrap()
    else {
        panic!("expected select");
    };
    let expected = AExpr::op(
        "AND",
        AExpr::op("=", AExpr::column("id"), AExpr::string("7")),
        AExpr::op("=", AExpr::column("n"), AExpr::literal("7")),
    );
    assert_eq!(expected, select.where_clause);
    assert_eq!("id = '7' AND n = 7", select.where_clause.to_string());
}

#[test]
fn script_with_mixed_statements() {
    let got = parse(
        "BEGIN;
         -- move a row
         INSERT INTO archive SELECT * FROM events WHERE id = 7;
         DELETE FROM events WHERE id = 7;
         COMMIT;",
    )
    .unwrap();
    let kinds: Vec<_> = got.iter().map(|s| s.kind()).collect();
    assert_eq!(vec!["BEGIN", "INSERT", "DELETE", "COMMIT"], kinds);
}

#[test]
fn parse_errors_are_not_empty_nodes() {
    for sql in [
        "SELECT * FROM",
        "SELECT * FROM t WHERE",
        "DELETE FROM t WHERE a =",
        "UPDATE t SET",
        "INSERT INTO t",
        "SET x",
        "SELECT 'unterminated",
        "SELECT * FROM t WHERE lower(a) = 'x'",
        "SELECT * FROM a WHERE a.id = 1 UNION SELECT * FROM b",
        "SELECT (SELECT max(id) FROM other) FROM t",
        "SELECT * FROM t /* unterminated",
        "EXPLAIN SELECT * FROM a UNION ALL SELECT * FROM b",
    ] {
        assert!(parse(sql).is_err(), "{sql}");
    }
}
