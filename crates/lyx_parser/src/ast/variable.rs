use std::fmt;

use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AstParseable, ObjectReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Set,
    Reset,
}

impl VarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Reset => "RESET",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `SET [LOCAL | SESSION] name {TO | =} value` or `RESET {name | ALL}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarSet {
    /// True for `SET LOCAL`, scoped to the current transaction.
    pub is_local: bool,
    pub var_type: VarType,
    pub name: String,
    /// Unquoted value text. Lists are joined with ", ". Empty for RESET.
    pub value: String,
}

impl AstParseable for VarSet {
    fn parse(parser: &mut Parser) -> Result<Self> {
        if parser.parse_keyword(Keyword::RESET) {
            let name = if parser.parse_keyword(Keyword::ALL) {
                "all".to_string()
            } else {
                ObjectReference::parse(parser)?.to_string()
            };
            return Ok(VarSet {
                is_local: false,
                var_type: VarType::Reset,
                name,
                value: String::new(),
            });
        }

        parser.expect_keyword(Keyword::SET)?;

        let is_local = matches!(
            parser.parse_one_of_keywords(&[Keyword::LOCAL, Keyword::SESSION]),
            Some(Keyword::LOCAL)
        );

        // `SET TIME ZONE value` is the one form without TO or =.
        if parser.parse_keyword_sequence(&[Keyword::TIME, Keyword::ZONE]) {
            return Ok(VarSet {
                is_local,
                var_type: VarType::Set,
                name: "timezone".to_string(),
                value: Self::parse_value(parser)?,
            });
        }

        let name = ObjectReference::parse(parser)?.to_string();
        if !(parser.parse_keyword(Keyword::TO) || parser.consume_token(&Token::Eq)) {
            return Err(parser.expected(&format!("'SET {name} TO <value>' or 'SET {name} = <value>'")));
        }

        Ok(VarSet {
            is_local,
            var_type: VarType::Set,
            name,
            value: Self::parse_value(parser)?,
        })
    }
}

impl VarSet {
    fn parse_value(parser: &mut Parser) -> Result<String> {
        let parts = parser.parse_comma_separated(|parser| {
            let part = match parser.peek().map(|t| t.token.clone()) {
                Some(Token::SingleQuotedString(s)) => s,
                Some(Token::Number(n)) => n,
                Some(Token::Word(w)) => w.value,
                Some(Token::Minus) => {
                    parser.next();
                    match parser.peek().map(|t| t.token.clone()) {
                        Some(Token::Number(n)) => format!("-{n}"),
                        _ => return Err(parser.expected("a number after '-'")),
                    }
                }
                _ => return Err(parser.expected("a variable value")),
            };
            parser.next();
            Ok(part)
        })?;
        Ok(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_local_string() {
        let got: VarSet = parse_ast("SET LOCAL statement_timeout = '5s'").unwrap();
        let expected = VarSet {
            is_local: true,
            var_type: VarType::Set,
            name: "statement_timeout".to_string(),
            value: "5s".to_string(),
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn set_session_to_number() {
        let got: VarSet = parse_ast("set session work_mem to 65536").unwrap();
        let expected = VarSet {
            is_local: false,
            var_type: VarType::Set,
            name: "work_mem".to_string(),
            value: "65536".to_string(),
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn set_compound_name_and_list() {
        let got: VarSet = parse_ast("SET search_path TO tenant_1, public").unwrap();
        assert_eq!("search_path", got.name);
        assert_eq!("tenant_1, public", got.value);

        let got: VarSet = parse_ast("SET myapp.shard = -3").unwrap();
        assert_eq!("myapp.shard", got.name);
        assert_eq!("-3", got.value);
    }

    #[test]
    fn set_time_zone() {
        let got: VarSet = parse_ast("SET LOCAL TIME ZONE 'UTC'").unwrap();
        assert_eq!(
            VarSet {
                is_local: true,
                var_type: VarType::Set,
                name: "timezone".to_string(),
                value: "UTC".to_string(),
            },
            got
        );
    }

    #[test]
    fn reset() {
        let got: VarSet = parse_ast("RESET statement_timeout").unwrap();
        assert_eq!(
            VarSet {
                is_local: false,
                var_type: VarType::Reset,
                name: "statement_timeout".to_string(),
                value: String::new(),
            },
            got
        );

        let got: VarSet = parse_ast("RESET ALL").unwrap();
        assert_eq!("all", got.name);
    }

    #[test]
    fn set_missing_value() {
        assert!(parse_ast::<VarSet>("SET statement_timeout").is_err());
        assert!(parse_ast::<VarSet>("SET statement_timeout =").is_err());
    }
}
