use crate::errors::{Result, unsupported};
use crate::keywords::Keyword;
use crate::parser::{Parser, parse_optional_where};
use crate::tokens::Token;

use super::{AExpr, AstParseable, FromClauseNode, Ident, RangeVar};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Copy {
    pub table_ref: FromClauseNode,
    pub where_clause: AExpr,
    /// True for `COPY ... FROM` (writes into the table), false for
    /// `COPY ... TO` (reads from it).
    pub is_from: bool,
}

impl AstParseable for Copy {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::COPY)?;

        if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            return Err(unsupported!("COPY (query) TO"));
        }

        let (schema, relation) = parser.parse_relation_name()?;
        let table_ref = RangeVar::new(schema, relation).into();

        if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            parser.parse_parenthesized_comma_separated(Ident::parse)?;
        }

        let is_from = match parser.parse_one_of_keywords(&[Keyword::FROM, Keyword::TO]) {
            Some(Keyword::FROM) => true,
            Some(_) => false,
            None => return Err(parser.expected("FROM or TO")),
        };

        // Target (file, STDIN, PROGRAM '...') and options.
        parser.skip_until(|t| t.is_keyword(Keyword::WHERE));

        let where_clause = parse_optional_where(parser)?;

        Ok(Copy {
            table_ref,
            where_clause,
            is_from,
        })
    }
}
