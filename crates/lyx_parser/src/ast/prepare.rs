use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AExpr, AstParseable, Ident};

/// `PREPARE name [(types)] AS statement`
///
/// Only the plan name is kept. The shape of the prepared statement is for
/// whoever tracks prepared plans to remember.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prepare {
    pub id: String,
}

impl AstParseable for Prepare {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::PREPARE)?;
        let id = Ident::parse(parser)?.value;

        if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            parser.next();
            parser.skip_statement();
            parser.expect_token(&Token::RightParen)?;
        }

        parser.expect_keyword(Keyword::AS)?;
        // Body still needs to be valid.
        parser.parse_statement()?;

        Ok(Prepare { id })
    }
}

/// `EXECUTE name [(args)]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Execute {
    pub id: String,
}

impl AstParseable for Execute {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::EXECUTE)?;
        let id = Ident::parse(parser)?.value;

        if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            parser.parse_parenthesized_comma_separated(AExpr::parse)?;
        }

        Ok(Execute { id })
    }
}
