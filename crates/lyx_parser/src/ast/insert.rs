use crate::errors::{ParseError, Result};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AExpr, AstParseable, FromClauseNode, Ident, RangeVar, Select};

/// Where the rows of an INSERT come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InsertSource {
    /// Values from every VALUES row, flattened in the order written.
    ///
    /// Never empty.
    Values(Vec<AExpr>),
    SubSelect(Box<Select>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Insert {
    table_ref: FromClauseNode,
    columns: Vec<String>,
    source: InsertSource,
}

impl Insert {
    /// Create an INSERT from either a list of values or a subquery.
    ///
    /// Exactly one source must be provided, providing both or neither (an
    /// empty values list counts as not provided) is an error.
    pub fn try_new(
        table_ref: impl Into<FromClauseNode>,
        columns: Vec<String>,
        values: Vec<AExpr>,
        sub_select: Option<Select>,
    ) -> Result<Self> {
        let source = match (values.is_empty(), sub_select) {
            (false, None) => InsertSource::Values(values),
            (true, Some(select)) => InsertSource::SubSelect(Box::new(select)),
            (false, Some(_)) => {
                return Err(ParseError::InvalidInsert(
                    "both VALUES and a subquery provided".to_string(),
                ));
            }
            (true, None) => {
                return Err(ParseError::InvalidInsert(
                    "neither VALUES nor a subquery provided".to_string(),
                ));
            }
        };

        Ok(Insert {
            table_ref: table_ref.into(),
            columns,
            source,
        })
    }

    pub fn table_ref(&self) -> &FromClauseNode {
        &self.table_ref
    }

    /// Target column names, empty if none were listed.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn source(&self) -> &InsertSource {
        &self.source
    }

    /// The flattened VALUES, None if the rows come from a subquery.
    pub fn values(&self) -> Option<&[AExpr]> {
        match &self.source {
            InsertSource::Values(values) => Some(values),
            InsertSource::SubSelect(_) => None,
        }
    }

    pub fn sub_select(&self) -> Option<&Select> {
        match &self.source {
            InsertSource::Values(_) => None,
            InsertSource::SubSelect(select) => Some(select),
        }
    }
}

impl AstParseable for Insert {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::INSERT)?;
        parser.expect_keyword(Keyword::INTO)?;

        let (schema, relation) = parser.parse_relation_name()?;
        let mut table = RangeVar::new(schema, relation);
        if parser.parse_keyword(Keyword::AS) {
            table = table.with_alias(Ident::parse(parser)?.value);
        }

        let columns = if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
            parser
                .parse_parenthesized_comma_separated(Ident::parse)?
                .into_iter()
                .map(|ident| ident.value)
                .collect()
        } else {
            Vec::new()
        };

        let mut values = Vec::new();
        let mut sub_select = None;

        if parser.parse_keyword(Keyword::VALUES) {
            let rows = parser.parse_comma_separated(|parser| {
                parser.parse_parenthesized_comma_separated(AExpr::parse)
            })?;
            values = rows.into_iter().flatten().collect();
        } else if parser.peek().is_some_and(|t| t.is_keyword(Keyword::SELECT)) {
            sub_select = Some(Select::parse(parser)?);
        } else {
            return Err(parser.expected("VALUES or SELECT"));
        }

        // ON CONFLICT and RETURNING don't change the target.
        if let Some(kw) = parser.parse_one_of_keywords(&[Keyword::ON, Keyword::RETURNING]) {
            let clause = if kw == Keyword::ON { "ON CONFLICT" } else { "RETURNING" };
            parser.skip_until_no_subquery(clause, |_| false)?;
        }

        Insert::try_new(table, columns, values, sub_select)
    }
}
