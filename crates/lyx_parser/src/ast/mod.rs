pub mod copy;
pub use copy::*;
pub mod create_table;
pub use create_table::*;
pub mod delete;
pub use delete::*;
pub mod explain;
pub use explain::*;
pub mod expr;
pub use expr::*;
pub mod from;
pub use from::*;
pub mod insert;
pub use insert::*;
pub mod prepare;
pub use prepare::*;
pub mod select;
pub use select::*;
pub mod update;
pub use update::*;
pub mod variable;
pub use variable::*;

use std::fmt;

use crate::errors::Result;
use crate::parser::Parser;
use crate::tokens::Token;

pub trait AstParseable: Sized {
    /// Parse an instance of Self from the provided parser.
    ///
    /// It's assumed that the parser is in the correct state for parsing Self,
    /// and if it isn't, an error should be returned.
    fn parse(parser: &mut Parser) -> Result<Self>;
}


/// A single identifier.
///
/// Unquoted identifiers are folded to lower case, quoted identifiers are kept
/// as written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident {
    pub value: String,
}

impl Ident {
    pub fn from_string(s: impl Into<String>) -> Self {
        Ident { value: s.into() }
    }
}

impl AstParseable for Ident {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let ident = match parser.peek().map(|t| &t.token) {
            Some(Token::Word(w)) => match w.quote {
                Some(_) => Ident {
                    value: w.value.clone(),
                },
                None => Ident {
                    value: w.value.to_lowercase(),
                },
            },
            _ => return Err(parser.expected("an identifier")),
        };
        parser.next();
        Ok(ident)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A possibly qualified name, e.g. `schema.table` or `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectReference(pub Vec<Ident>);

impl ObjectReference {
    /// Create an object from an iterator of strings.
    ///
    /// Useful in tests, probably unlikely that it should be used anywhere else.
    pub fn from_strings<S>(strings: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        ObjectReference(strings.into_iter().map(Ident::from_string).collect())
    }
}

impl AstParseable for ObjectReference {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let mut idents = Vec::new();
        loop {
            idents.push(Ident::parse(parser)?);

            // Check if the next token is a period for possible compound
            // identifiers. If not, we're done.
            if !parser.consume_token(&Token::Period) {
                break;
            }
        }

        Ok(ObjectReference(idents))
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strings: Vec<_> = self.0.iter().map(|ident| ident.value.as_str()).collect();
        write!(f, "{}", strings.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::parse_ast;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unquoted_ident_folded() {
        let got: Ident = parse_ast("MyTable").unwrap();
        assert_eq!(Ident::from_string("mytable"), got);
    }

    #[test]
    fn quoted_ident_kept() {
        let got: Ident = parse_ast("\"MyTable\"").unwrap();
        assert_eq!(Ident::from_string("MyTable"), got);
    }

    #[test]
    fn compound_reference() {
        let got: ObjectReference = parse_ast("public.Users").unwrap();
        assert_eq!(ObjectReference::from_strings(["public", "users"]), got);
        assert_eq!("public.users", got.to_string());
    }

    #[test]
    fn reference_requires_ident_after_period() {
        assert!(parse_ast::<ObjectReference>("public.").is_err());
    }
}
