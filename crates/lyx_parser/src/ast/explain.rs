use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::statement::Statement;
use crate::tokens::Token;

use super::AstParseable;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Explain {
    pub stmt: Box<Statement>,
}

impl AstParseable for Explain {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::EXPLAIN)?;

        if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            // EXPLAIN (ANALYZE, FORMAT JSON) ...
            parser.next();
            parser.skip_statement();
            parser.expect_token(&Token::RightParen)?;
        } else {
            parser.parse_keyword(Keyword::ANALYZE);
            parser.parse_keyword(Keyword::VERBOSE);
        }

        let stmt = parser.parse_statement()?;
        Ok(Explain {
            stmt: Box::new(stmt),
        })
    }
}
