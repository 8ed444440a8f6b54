use crate::errors::{Result, unsupported};
use crate::keywords::{Keyword, RESERVED_FOR_TABLE_ALIAS};
use crate::parser::{Parser, parse_optional_where};

use super::{AExpr, AstParseable, FromClauseNode, RangeVar, SetAlias};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delete {
    pub table_ref: FromClauseNode,
    /// `AExpr::Empty` for an unconditional delete.
    pub where_clause: AExpr,
}

impl AstParseable for Delete {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::DELETE)?;
        parser.expect_keyword(Keyword::FROM)?;

        let (schema, relation) = parser.parse_relation_name()?;
        let mut table_ref: FromClauseNode = RangeVar::new(schema, relation).into();
        if let Some(alias) = parser.parse_alias(RESERVED_FOR_TABLE_ALIAS)? {
            table_ref.set_alias(alias.value);
        }

        if parser.peek().is_some_and(|t| t.is_keyword(Keyword::USING)) {
            return Err(unsupported!("DELETE ... USING"));
        }

        let where_clause = parse_optional_where(parser)?;

        if parser.parse_keyword(Keyword::RETURNING) {
            parser.skip_until_no_subquery("RETURNING", |_| false)?;
        }

        Ok(Delete {
            table_ref,
            where_clause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;
    use pretty_assertions::assert_eq;

    #[test]
    fn unconditional() {
        let got: Delete = parse_ast("DELETE FROM t").unwrap();
        let expected = Delete {
            table_ref: RangeVar::relation("t").into(),
            where_clause: AExpr::Empty,
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn with_where_and_alias() {
        let got: Delete = parse_ast("DELETE FROM s.orders AS o WHERE o.customer_id = $1").unwrap();
        let expected = Delete {
            table_ref: RangeVar::new("s", "orders").with_alias("o").into(),
            where_clause: AExpr::op("=", AExpr::column("o.customer_id"), AExpr::parameter("$1")),
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn requires_from() {
        assert!(parse_ast::<Delete>("DELETE t").is_err());
    }
}
