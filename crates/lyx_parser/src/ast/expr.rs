use std::fmt;

use crate::errors::{Result, unsupported};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AstParseable, ObjectReference};

// Precedences, ordered low to high.
//
// See <https://www.postgresql.org/docs/16/sql-syntax-lexical.html#SQL-PRECEDENCE>
const PREC_OR: u8 = 10;
const PREC_AND: u8 = 20;
const PREC_NOT: u8 = 30;
const PREC_IS: u8 = 40;
const PREC_COMPARISON: u8 = 50; // <=, =, etc
const PREC_CONTAINMENT: u8 = 60; // LIKE
const PREC_ADD_SUB: u8 = 80;
const PREC_MUL_DIV_MOD: u8 = 90;
const PREC_LEAF: u8 = u8::MAX;

/// A column name, optionally qualified by the alias (or name) of the relation
/// it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Empty if the column is unqualified.
    pub table_alias: String,
    pub col_name: String,
}

impl ColumnRef {
    pub fn new(table_alias: impl Into<String>, col_name: impl Into<String>) -> Self {
        ColumnRef {
            table_alias: table_alias.into(),
            col_name: col_name.into(),
        }
    }

    pub fn unqualified(col_name: impl Into<String>) -> Self {
        Self::new("", col_name)
    }

    pub fn is_qualified(&self) -> bool {
        !self.table_alias.is_empty()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_qualified() {
            write!(f, "{}.{}", self.table_alias, self.col_name)
        } else {
            write!(f, "{}", self.col_name)
        }
    }
}

/// What the text of a leaf stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// Number, boolean or NULL.
    Literal,
    /// Single quoted string, stored without the quotes and with `''`
    /// unescaped.
    String,
    /// Possibly qualified column reference, e.g. `a.x`.
    Column,
    /// Positional parameter, e.g. `$1`.
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AExprLeaf {
    pub value: String,
    pub kind: LeafKind,
}

impl AExprLeaf {
    /// Interpret this leaf as a column reference.
    ///
    /// Returns None for literals and parameters. For compound names the last
    /// part is the column and everything before it names the relation, e.g.
    /// `s.t.c` references column `c` of `s.t`.
    pub fn column_ref(&self) -> Option<ColumnRef> {
        if self.kind != LeafKind::Column {
            return None;
        }
        match self.value.rsplit_once('.') {
            Some((table, col)) => Some(ColumnRef::new(table, col)),
            None => Some(ColumnRef::unqualified(self.value.clone())),
        }
    }
}

impl fmt::Display for AExprLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_leaf_value(f, &self.value, self.kind)
    }
}

/// Write a leaf value the way it would appear in SQL.
pub(crate) fn fmt_leaf_value(
    f: &mut fmt::Formatter<'_>,
    value: &str,
    kind: LeafKind,
) -> fmt::Result {
    match kind {
        LeafKind::String => write!(f, "'{}'", value.replace('\'', "''")),
        LeafKind::Literal | LeafKind::Column | LeafKind::Parameter => write!(f, "{value}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AExprOp {
    pub left: Box<AExpr>,
    pub right: Box<AExpr>,
    /// Operator token, e.g. `=`, `AND`, `LIKE`.
    ///
    /// Unary operators (`NOT`) have an `Empty` left side.
    pub op: String,
}

/// A predicate tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AExpr {
    /// No predicate present.
    Empty,
    Leaf(AExprLeaf),
    Op(AExprOp),
}

impl AExpr {
    pub fn literal(value: impl Into<String>) -> Self {
        AExpr::Leaf(AExprLeaf {
            value: value.into(),
            kind: LeafKind::Literal,
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        AExpr::Leaf(AExprLeaf {
            value: value.into(),
            kind: LeafKind::String,
        })
    }

    pub fn column(value: impl Into<String>) -> Self {
        AExpr::Leaf(AExprLeaf {
            value: value.into(),
            kind: LeafKind::Column,
        })
    }

    pub fn parameter(value: impl Into<String>) -> Self {
        AExpr::Leaf(AExprLeaf {
            value: value.into(),
            kind: LeafKind::Parameter,
        })
    }

    pub fn op(op: impl Into<String>, left: AExpr, right: AExpr) -> Self {
        AExpr::Op(AExprOp {
            left: Box::new(left),
            right: Box::new(right),
            op: op.into(),
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AExpr::Empty)
    }

    fn precedence(&self) -> u8 {
        match self {
            AExpr::Empty | AExpr::Leaf(_) => PREC_LEAF,
            AExpr::Op(op) => op_precedence(&op.op),
        }
    }
}

impl Drop for AExpr {
    fn drop(&mut self) {
        // Long AND/OR chains nest one level per term. Take the tree apart
        // with an explicit stack so dropping it doesn't recurse.
        let AExpr::Op(op) = self else {
            return;
        };
        if !matches!(*op.left, AExpr::Op(_)) && !matches!(*op.right, AExpr::Op(_)) {
            return;
        }
        let mut stack = vec![
            std::mem::replace(op.left.as_mut(), AExpr::Empty),
            std::mem::replace(op.right.as_mut(), AExpr::Empty),
        ];
        while let Some(mut expr) = stack.pop() {
            if let AExpr::Op(op) = &mut expr {
                stack.push(std::mem::replace(op.left.as_mut(), AExpr::Empty));
                stack.push(std::mem::replace(op.right.as_mut(), AExpr::Empty));
            }
        }
    }
}

/// Precedence of an operator token as stored in an `AExprOp`.
///
/// Unknown operators bind tighter than any known operator.
fn op_precedence(op: &str) -> u8 {
    match op {
        "OR" => PREC_OR,
        "AND" => PREC_AND,
        "NOT" => PREC_NOT,
        "IS" | "IS NOT" => PREC_IS,
        "=" | "<>" | "<" | "<=" | ">" | ">=" => PREC_COMPARISON,
        "LIKE" | "NOT LIKE" => PREC_CONTAINMENT,
        "+" | "-" => PREC_ADD_SUB,
        "*" | "/" | "%" => PREC_MUL_DIV_MOD,
        _ => PREC_MUL_DIV_MOD + 1,
    }
}

impl fmt::Display for AExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AExpr::Empty => Ok(()),
            AExpr::Leaf(leaf) => write!(f, "{leaf}"),
            AExpr::Op(op) => {
                let prec = op_precedence(&op.op);
                // Operators are left associative, so a right child of equal
                // precedence needs parens while a left child doesn't.
                let write_child = |f: &mut fmt::Formatter<'_>, child: &AExpr, needs_parens| {
                    if needs_parens {
                        write!(f, "({child})")
                    } else {
                        write!(f, "{child}")
                    }
                };

                if !op.left.is_empty() {
                    write_child(f, &op.left, op.left.precedence() < prec)?;
                    write!(f, " ")?;
                }
                write!(f, "{}", op.op)?;
                if !op.right.is_empty() {
                    write!(f, " ")?;
                    write_child(f, &op.right, op.right.precedence() <= prec)?;
                }
                Ok(())
            }
        }
    }
}

impl AstParseable for AExpr {
    fn parse(parser: &mut Parser) -> Result<Self> {
        Self::parse_subexpr(parser, 0)
    }
}

impl AExpr {
    fn parse_subexpr(parser: &mut Parser, precedence: u8) -> Result<Self> {
        parser.nested(|parser| {
            let mut expr = AExpr::parse_prefix(parser)?;

            loop {
                // Casts don't change what a value constrains, `$1::int` is kept
                // as `$1`.
                if parser.consume_token(&Token::DoubleColon) {
                    ObjectReference::parse(parser)?;
                    continue;
                }

                let next_precedence = Self::get_infix_precedence(parser);
                if precedence >= next_precedence {
                    break;
                }

                expr = Self::parse_infix(parser, expr, next_precedence)?;
            }

            Ok(expr)
        })
    }

    fn parse_prefix(parser: &mut Parser) -> Result<Self> {
        let tok = match parser.peek() {
            Some(tok) => tok.token.clone(),
            None => return Err(parser.expected("an expression")),
        };

        let expr = match tok {
            Token::Word(w) => match w.keyword {
                Some(Keyword::NOT) => {
                    parser.next();
                    let expr = AExpr::parse_subexpr(parser, PREC_NOT)?;
                    return Ok(AExpr::op("NOT", AExpr::Empty, expr));
                }
                Some(Keyword::TRUE) => AExpr::literal("TRUE"),
                Some(Keyword::FALSE) => AExpr::literal("FALSE"),
                Some(Keyword::NULL) => AExpr::literal("NULL"),
                _ => {
                    let reference = ObjectReference::parse(parser)?;
                    if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
                        return Err(unsupported!("function call {reference}(...) in predicate"));
                    }
                    return Ok(AExpr::column(reference.to_string()));
                }
            },
            Token::Number(n) => AExpr::literal(n),
            Token::SingleQuotedString(s) => AExpr::string(s),
            Token::Placeholder(p) => AExpr::parameter(p),
            Token::Minus => {
                parser.next();
                return match parser.peek().map(|t| t.token.clone()) {
                    Some(Token::Number(n)) => {
                        parser.next();
                        Ok(AExpr::literal(format!("-{n}")))
                    }
                    _ => Err(parser.expected("a number after '-'")),
                };
            }
            Token::LeftParen => {
                parser.next();
                if parser.peek().is_some_and(|t| t.is_keyword(Keyword::SELECT)) {
                    return Err(unsupported!("subquery in predicate"));
                }
                let expr = AExpr::parse(parser)?;
                parser.expect_token(&Token::RightParen)?;
                return Ok(expr);
            }
            _ => return Err(parser.expected("an expression")),
        };

        parser.next();
        Ok(expr)
    }

    fn parse_infix(parser: &mut Parser, prefix: AExpr, precedence: u8) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok.token.clone(),
            None => return Err(parser.expected("an operator")),
        };

        let op = match tok {
            Token::Eq => "=",
            Token::Neq => "<>",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Mul => "*",
            Token::Div => "/",
            Token::Mod => "%",
            Token::Word(w) => match w.keyword {
                Some(Keyword::AND) => "AND",
                Some(Keyword::OR) => "OR",
                Some(Keyword::LIKE) => "LIKE",
                Some(Keyword::NOT) => {
                    parser.expect_keyword(Keyword::LIKE)?;
                    "NOT LIKE"
                }
                Some(Keyword::IS) => {
                    let op = if parser.parse_keyword(Keyword::NOT) {
                        "IS NOT"
                    } else {
                        "IS"
                    };
                    let right = match parser.parse_one_of_keywords(&[
                        Keyword::NULL,
                        Keyword::TRUE,
                        Keyword::FALSE,
                    ]) {
                        Some(Keyword::NULL) => AExpr::literal("NULL"),
                        Some(Keyword::TRUE) => AExpr::literal("TRUE"),
                        Some(Keyword::FALSE) => AExpr::literal("FALSE"),
                        _ => return Err(parser.expected("NULL, TRUE, or FALSE")),
                    };
                    return Ok(AExpr::op(op, prefix, right));
                }
                _ => return Err(unsupported!("operator {w}")),
            },
            other => return Err(unsupported!("operator '{other}'")),
        };

        let right = AExpr::parse_subexpr(parser, precedence)?;
        Ok(AExpr::op(op, prefix, right))
    }

    /// Get the relative precedence of the next operator.
    ///
    /// Zero is returned if the next token doesn't continue the expression.
    fn get_infix_precedence(parser: &Parser) -> u8 {
        let tok = match parser.peek() {
            Some(tok) => &tok.token,
            None => return 0,
        };

        match tok {
            Token::Word(w) if w.keyword == Some(Keyword::OR) => PREC_OR,
            Token::Word(w) if w.keyword == Some(Keyword::AND) => PREC_AND,
            Token::Word(w) if w.keyword == Some(Keyword::IS) => PREC_IS,
            Token::Word(w) if w.keyword == Some(Keyword::LIKE) => PREC_CONTAINMENT,
            Token::Word(w) if w.keyword == Some(Keyword::NOT) => {
                // Only `NOT LIKE` continues an expression.
                match parser.peek_nth(1) {
                    Some(tok) if tok.is_keyword(Keyword::LIKE) => PREC_CONTAINMENT,
                    _ => 0,
                }
            }

            Token::Eq | Token::Neq | Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => {
                PREC_COMPARISON
            }

            Token::Plus | Token::Minus => PREC_ADD_SUB,
            Token::Mul | Token::Div | Token::Mod => PREC_MUL_DIV_MOD,

            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;
    use crate::errors::ParseError;
    use pretty_assertions::assert_eq;

    #[test]
    fn simple_comparison() {
        let got: AExpr = parse_ast("a.x = 1").unwrap();
        let expected = AExpr::op("=", AExpr::column("a.x"), AExpr::literal("1"));
        assert_eq!(expected, got);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let got: AExpr = parse_ast("a = 1 OR b = 2 AND c = 3").unwrap();
        let expected = AExpr::op(
            "OR",
            AExpr::op("=", AExpr::column("a"), AExpr::literal("1")),
            AExpr::op(
                "AND",
                AExpr::op("=", AExpr::column("b"), AExpr::literal("2")),
                AExpr::op("=", AExpr::column("c"), AExpr::literal("3")),
            ),
        );
        assert_eq!(expected, got);
    }

    #[test]
    fn left_associative_chain() {
        let got: AExpr = parse_ast("a = 1 AND b = 2 AND c = 3").unwrap();
        let expected = AExpr::op(
            "AND",
            AExpr::op(
                "AND",
                AExpr::op("=", AExpr::column("a"), AExpr::literal("1")),
                AExpr::op("=", AExpr::column("b"), AExpr::literal("2")),
            ),
            AExpr::op("=", AExpr::column("c"), AExpr::literal("3")),
        );
        assert_eq!(expected, got);
        assert_eq!("a = 1 AND b = 2 AND c = 3", got.to_string());
    }

    #[test]
    fn parens_override_precedence() {
        let got: AExpr = parse_ast("(a = 1 OR b = 2) AND c = 3").unwrap();
        let expected = AExpr::op(
            "AND",
            AExpr::op(
                "OR",
                AExpr::op("=", AExpr::column("a"), AExpr::literal("1")),
                AExpr::op("=", AExpr::column("b"), AExpr::literal("2")),
            ),
            AExpr::op("=", AExpr::column("c"), AExpr::literal("3")),
        );
        assert_eq!(expected, got);
        assert_eq!("(a = 1 OR b = 2) AND c = 3", got.to_string());
    }

    #[test]
    fn not_and_is_null() {
        let got: AExpr = parse_ast("NOT deleted AND owner IS NOT NULL").unwrap();
        let expected = AExpr::op(
            "AND",
            AExpr::op("NOT", AExpr::Empty, AExpr::column("deleted")),
            AExpr::op("IS NOT", AExpr::column("owner"), AExpr::literal("NULL")),
        );
        assert_eq!(expected, got);
        assert_eq!("NOT deleted AND owner IS NOT NULL", got.to_string());
    }

    #[test]
    fn literals_and_params() {
        let got: AExpr = parse_ast("name <> 'bob''s' AND id != $1 AND t > -5").unwrap();
        let expected = AExpr::op(
            "AND",
            AExpr::op(
                "AND",
                AExpr::op("<>", AExpr::column("name"), AExpr::string("bob's")),
                AExpr::op("<>", AExpr::column("id"), AExpr::parameter("$1")),
            ),
            AExpr::op(">", AExpr::column("t"), AExpr::literal("-5")),
        );
        assert_eq!(expected, got);
        assert_eq!("name <> 'bob''s' AND id <> $1 AND t > -5", got.to_string());
    }

    #[test]
    fn arithmetic_passes_through() {
        let got: AExpr = parse_ast("a + 1 * 2 = b").unwrap();
        let expected = AExpr::op(
            "=",
            AExpr::op(
                "+",
                AExpr::column("a"),
                AExpr::op("*", AExpr::literal("1"), AExpr::literal("2")),
            ),
            AExpr::column("b"),
        );
        assert_eq!(expected, got);
    }

    #[test]
    fn casts_dropped() {
        let got: AExpr = parse_ast("id = $1::bigint AND s = 'x'::text").unwrap();
        let expected = AExpr::op(
            "AND",
            AExpr::op("=", AExpr::column("id"), AExpr::parameter("$1")),
            AExpr::op("=", AExpr::column("s"), AExpr::string("x")),
        );
        assert_eq!(expected, got);
    }

    #[test]
    fn function_call_unsupported() {
        assert!(parse_ast::<AExpr>("lower(name) = 'a'").is_err());
    }

    #[test]
    fn column_ref_from_leaf() {
        let leaf = |expr: AExpr| match &expr {
            AExpr::Leaf(leaf) => leaf.clone(),
            other => panic!("not a leaf: {other:?}"),
        };

        assert_eq!(
            Some(ColumnRef::new("a", "x")),
            leaf(AExpr::column("a.x")).column_ref()
        );
        assert_eq!(
            Some(ColumnRef::new("s.t", "x")),
            leaf(AExpr::column("s.t.x")).column_ref()
        );
        assert_eq!(
            Some(ColumnRef::unqualified("x")),
            leaf(AExpr::column("x")).column_ref()
        );
        assert_eq!(None, leaf(AExpr::literal("a.x")).column_ref());
        assert_eq!(None, leaf(AExpr::string("a.x")).column_ref());
    }

    #[test]
    fn display_unknown_operator_binds_tightly() {
        let expr = AExpr::op(
            "=",
            AExpr::op("@>", AExpr::column("tags"), AExpr::string("x")),
            AExpr::literal("TRUE"),
        );
        assert_eq!("tags @> 'x' = TRUE", expr.to_string());
    }

    #[test]
    fn display_keeps_string_literals_quoted() {
        let got: AExpr = parse_ast("s = 'it''s' AND n = '42' AND m = 42").unwrap();
        assert_eq!("s = 'it''s' AND n = '42' AND m = 42", got.to_string());

        // String and number with the same text stay distinguishable.
        let reparsed: AExpr = parse_ast(&got.to_string()).unwrap();
        assert_eq!(got, reparsed);
    }

    #[test]
    fn deep_parens_are_errors() {
        let depth = crate::parser::MAX_NESTING_DEPTH + 1;
        let sql = format!("{}a = 1{}", "(".repeat(depth), ")".repeat(depth));
        let err = parse_ast::<AExpr>(&sql).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{err}");

        let sql = format!("{}a = 1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(
            AExpr::op("=", AExpr::column("a"), AExpr::literal("1")),
            parse_ast::<AExpr>(&sql).unwrap()
        );

        let sql = format!("{}deleted", "NOT ".repeat(depth));
        assert!(parse_ast::<AExpr>(&sql).is_err());
    }

    #[test]
    fn long_and_chain_parses() {
        let sql = (0..10_000)
            .map(|i| format!("c{i} = {i}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let got: AExpr = parse_ast(&sql).unwrap();
        let AExpr::Op(op) = &got else {
            panic!("expected an operator, got {got:?}");
        };
        assert_eq!("AND", op.op);
        assert_eq!(AExpr::op("=", AExpr::column("c9999"), AExpr::literal("9999")), *op.right);
    }
}
