use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AstParseable, Ident, ObjectReference};

/// Keywords starting a table constraint instead of a column definition.
const TABLE_CONSTRAINTS: &[Keyword] = &[
    Keyword::CHECK,
    Keyword::CONSTRAINT,
    Keyword::FOREIGN,
    Keyword::PRIMARY,
    Keyword::UNIQUE,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableElt {
    pub col_name: String,
    /// Type name as written, including any modifiers, e.g. `varchar(32)`.
    pub col_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateTable {
    /// Possibly schema qualified table name.
    pub table_name: String,
    pub table_elts: Vec<TableElt>,
}

impl AstParseable for CreateTable {
    /// Parse the part of a CREATE TABLE after CREATE.
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.parse_one_of_keywords(&[Keyword::TEMP, Keyword::TEMPORARY]);
        parser.expect_keyword(Keyword::TABLE)?;
        parser.parse_keyword_sequence(&[Keyword::IF, Keyword::NOT, Keyword::EXISTS]);

        let table_name = ObjectReference::parse(parser)?.to_string();

        let mut table_elts = Vec::new();
        if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            let elts = parser.parse_parenthesized_comma_separated(Self::parse_table_elt)?;
            table_elts = elts.into_iter().flatten().collect();
        }

        Ok(CreateTable {
            table_name,
            table_elts,
        })
    }
}

impl CreateTable {
    /// Parse a column definition, returning None for table constraints.
    fn parse_table_elt(parser: &mut Parser) -> Result<Option<TableElt>> {
        let is_constraint = parser
            .peek()
            .is_some_and(|t| TABLE_CONSTRAINTS.iter().any(|k| t.is_keyword(*k)));
        if is_constraint {
            parser.skip_until(|t| t.token == Token::Comma);
            return Ok(None);
        }

        let col_name = Ident::parse(parser)?.value;

        let mut col_type = ObjectReference::parse(parser)?.to_string();
        if parser.consume_token(&Token::LeftParen) {
            let mut modifiers = Vec::new();
            loop {
                match parser.next().map(|t| t.token.clone()) {
                    Some(Token::RightParen) => break,
                    Some(Token::Comma) => (),
                    Some(tok) => modifiers.push(tok.to_string()),
                    None => return Err(parser.expected("')'")),
                }
            }
            col_type = format!("{col_type}({})", modifiers.join(","));
        }

        // Column constraints (NOT NULL, DEFAULT, ...).
        parser.skip_until(|t| t.token == Token::Comma);

        Ok(Some(TableElt { col_name, col_type }))
    }
}
