use crate::errors::{Result, unsupported};
use crate::keywords::Keyword;
use crate::parser::{Parser, parse_optional_where};

use super::{AExpr, AstParseable, FromClauseNode};

/// Clauses allowed after WHERE. They don't affect routing and are skipped.
const TRAILING_CLAUSES: &[Keyword] = &[
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::OFFSET,
];

/// Set operations combine relations we'd otherwise never look at.
const SET_OPERATIONS: &[Keyword] = &[Keyword::UNION, Keyword::INTERSECT, Keyword::EXCEPT];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Select {
    /// FROM items in the order they were written.
    pub from_clause: Vec<FromClauseNode>,
    pub where_clause: AExpr,
}

impl AstParseable for Select {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::SELECT)?;

        // Projections don't matter for routing, unless they read from
        // somewhere else.
        parser.skip_until_no_subquery("projection", |t| {
            t.is_keyword(Keyword::FROM)
                || t.is_keyword(Keyword::WHERE)
                || TRAILING_CLAUSES.iter().any(|k| t.is_keyword(*k))
                || SET_OPERATIONS.iter().any(|k| t.is_keyword(*k))
        })?;

        let from_clause = if parser.parse_keyword(Keyword::FROM) {
            parser.parse_comma_separated(FromClauseNode::parse)?
        } else {
            Vec::new()
        };

        let where_clause = parse_optional_where(parser)?;

        if parser.parse_one_of_keywords(TRAILING_CLAUSES).is_some() {
            parser.skip_until_no_subquery("trailing clause", |t| {
                SET_OPERATIONS.iter().any(|k| t.is_keyword(*k))
            })?;
        }

        if let Some(op) = parser.parse_one_of_keywords(SET_OPERATIONS) {
            return Err(unsupported!("{op:?}"));
        }

        if !parser.at_statement_end() {
            return Err(parser.expected("end of SELECT"));
        }

        Ok(Select {
            from_clause,
            where_clause,
        })
    }
}
