use crate::errors::{Result, unsupported};
use crate::keywords::{Keyword, RESERVED_FOR_TABLE_ALIAS};
use crate::parser::{Parser, parse_optional_where};
use crate::tokens::Token;

use super::{AExpr, AstParseable, FromClauseNode, Ident, RangeVar, SetAlias};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Update {
    pub table_ref: FromClauseNode,
    pub where_clause: AExpr,
}

impl AstParseable for Update {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::UPDATE)?;

        let (schema, relation) = parser.parse_relation_name()?;
        let mut table_ref: FromClauseNode = RangeVar::new(schema, relation).into();
        if let Some(alias) = parser.parse_alias(RESERVED_FOR_TABLE_ALIAS)? {
            table_ref.set_alias(alias.value);
        }

        parser.expect_keyword(Keyword::SET)?;
        // Assignments are validated but not kept.
        parser.parse_comma_separated(|parser| {
            Ident::parse(parser)?;
            parser.expect_token(&Token::Eq)?;
            AExpr::parse(parser)
        })?;

        if parser.peek().is_some_and(|t| t.is_keyword(Keyword::FROM)) {
            return Err(unsupported!("UPDATE ... FROM"));
        }

        let where_clause = parse_optional_where(parser)?;

        if parser.parse_keyword(Keyword::RETURNING) {
            parser.skip_until_no_subquery("RETURNING", |_| false)?;
        }

        Ok(Update {
            table_ref,
            where_clause,
        })
    }
}
