use std::fmt;

use crate::errors::{ParseError, Result, unsupported};
use crate::keywords::{Keyword, RESERVED_FOR_TABLE_ALIAS};
use crate::parser::{MAX_NESTING_DEPTH, Parser};
use crate::tokens::Token;

use super::{AExpr, AstParseable, Ident};

/// Assign an alias to a FROM clause item.
///
/// This is the only mutation allowed on a FROM clause tree once it's been
/// built. It applies to exactly the node it's called on, children keep their
/// own aliases.
pub trait SetAlias {
    fn set_alias(&mut self, alias: impl Into<String>);
}

/// A base relation or join subtree in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FromClauseNode {
    RangeVar(RangeVar),
    JoinExpr(JoinExpr),
}

impl FromClauseNode {
    /// Alias of this node, empty if none was given.
    pub fn alias(&self) -> &str {
        match self {
            Self::RangeVar(r) => r.alias(),
            Self::JoinExpr(j) => j.alias(),
        }
    }

    /// Base relations in this subtree, leftmost first.
    pub fn base_relations(&self) -> Vec<&RangeVar> {
        let mut relations = Vec::new();
        self.collect_base_relations(&mut relations);
        relations
    }

    fn collect_base_relations<'a>(&'a self, out: &mut Vec<&'a RangeVar>) {
        match self {
            Self::RangeVar(r) => out.push(r),
            Self::JoinExpr(j) => {
                j.larg.collect_base_relations(out);
                j.rarg.collect_base_relations(out);
            }
        }
    }
}

impl SetAlias for FromClauseNode {
    fn set_alias(&mut self, alias: impl Into<String>) {
        match self {
            Self::RangeVar(r) => r.set_alias(alias),
            Self::JoinExpr(j) => j.set_alias(alias),
        }
    }
}

impl From<RangeVar> for FromClauseNode {
    fn from(value: RangeVar) -> Self {
        FromClauseNode::RangeVar(value)
    }
}

impl From<JoinExpr> for FromClauseNode {
    fn from(value: JoinExpr) -> Self {
        FromClauseNode::JoinExpr(value)
    }
}

impl fmt::Display for FromClauseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangeVar(r) => write!(f, "{r}"),
            Self::JoinExpr(j) => write!(f, "{j}"),
        }
    }
}

impl AstParseable for FromClauseNode {
    /// Parse a FROM clause item including any joins following it.
    ///
    /// Joins are built left-deep in the order they're written, so
    /// `a JOIN b JOIN c` is `(a JOIN b) JOIN c`.
    fn parse(parser: &mut Parser) -> Result<Self> {
        let mut node = Self::parse_primary(parser)?;

        let mut joins = 0;
        while let Some(natural_or_cross) = Self::parse_join_keywords(parser)? {
            // Each join adds a level to the tree.
            joins += 1;
            if joins > MAX_NESTING_DEPTH {
                return Err(ParseError::NestingTooDeep {
                    limit: MAX_NESTING_DEPTH,
                });
            }

            let right = Self::parse_primary(parser)?;

            if !natural_or_cross {
                // Join quals don't affect which relations are touched, they're
                // parsed to make sure they're well formed and then dropped.
                if parser.parse_keyword(Keyword::ON) {
                    AExpr::parse(parser)?;
                } else if parser.parse_keyword(Keyword::USING) {
                    parser.parse_parenthesized_comma_separated(Ident::parse)?;
                }
            }

            node = JoinExpr::new(node, right).into();
        }

        Ok(node)
    }
}

impl FromClauseNode {
    /// Parse a single relation or parenthesized join, with an optional alias.
    fn parse_primary(parser: &mut Parser) -> Result<Self> {
        let mut node = if parser.consume_token(&Token::LeftParen) {
            if parser.peek().is_some_and(|t| t.is_keyword(Keyword::SELECT)) {
                return Err(unsupported!("subquery in FROM clause"));
            }
            let node = parser.nested(FromClauseNode::parse)?;
            parser.expect_token(&Token::RightParen)?;
            node
        } else {
            let (schema, relation) = parser.parse_relation_name()?;
            RangeVar::new(schema, relation).into()
        };

        if let Some(alias) = parser.parse_alias(RESERVED_FOR_TABLE_ALIAS)? {
            node.set_alias(alias.value);
            // Column aliases don't change the relation's visible name.
            if parser.peek().map(|t| &t.token) == Some(&Token::LeftParen) {
                parser.parse_parenthesized_comma_separated(Ident::parse)?;
            }
        }

        Ok(node)
    }

    /// Parse the keywords introducing a join.
    ///
    /// Returns None if the next tokens don't start a join, otherwise whether
    /// the join is a NATURAL or CROSS join (which take no join condition).
    fn parse_join_keywords(parser: &mut Parser) -> Result<Option<bool>> {
        let kw = match parser.peek().and_then(|t| t.keyword()) {
            Some(kw) => kw,
            None => return Ok(None),
        };

        let natural_or_cross = match kw {
            Keyword::CROSS => {
                parser.expect_keyword(Keyword::CROSS)?;
                parser.expect_keyword(Keyword::JOIN)?;
                return Ok(Some(true));
            }
            Keyword::NATURAL => {
                parser.expect_keyword(Keyword::NATURAL)?;
                true
            }
            Keyword::JOIN | Keyword::INNER | Keyword::LEFT | Keyword::RIGHT | Keyword::FULL => {
                false
            }
            _ => return Ok(None),
        };

        match parser.parse_one_of_keywords(&[
            Keyword::JOIN,
            Keyword::INNER,
            Keyword::LEFT,
            Keyword::RIGHT,
            Keyword::FULL,
        ]) {
            Some(Keyword::JOIN) => (),
            Some(Keyword::INNER) => parser.expect_keyword(Keyword::JOIN)?,
            Some(_) => {
                // LEFT, RIGHT, FULL
                parser.parse_keyword(Keyword::OUTER); // Optional OUTER
                parser.expect_keyword(Keyword::JOIN)?;
            }
            None => return Err(parser.expected("JOIN")),
        }

        Ok(Some(natural_or_cross))
    }
}

/// A single base relation, optionally schema qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeVar {
    schema_name: String,
    relation_name: String,
    alias: String,
}

impl RangeVar {
    /// Create a relation reference. An empty schema name means the relation
    /// is unqualified.
    pub fn new(schema_name: impl Into<String>, relation_name: impl Into<String>) -> Self {
        RangeVar {
            schema_name: schema_name.into(),
            relation_name: relation_name.into(),
            alias: String::new(),
        }
    }

    /// Create an unqualified relation reference.
    pub fn relation(relation_name: impl Into<String>) -> Self {
        Self::new("", relation_name)
    }

    /// Builder-style alias assignment.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(alias);
        self
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The name columns of this relation are qualified with, the alias if
    /// there is one.
    pub fn visible_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.relation_name
        } else {
            &self.alias
        }
    }

    /// `schema.relation` or just `relation` if unqualified.
    pub fn qualified_name(&self) -> String {
        if self.schema_name.is_empty() {
            self.relation_name.clone()
        } else {
            format!("{}.{}", self.schema_name, self.relation_name)
        }
    }
}

impl SetAlias for RangeVar {
    fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }
}

impl fmt::Display for RangeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())?;
        if !self.alias.is_empty() {
            write!(f, " AS {}", self.alias)?;
        }
        Ok(())
    }
}

/// A join of two FROM clause subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinExpr {
    larg: Box<FromClauseNode>,
    rarg: Box<FromClauseNode>,
    /// Alias for the combined output of the join.
    ///
    /// An aliased join hides the names of the relations inside it.
    alias: String,
}

impl JoinExpr {
    pub fn new(larg: impl Into<FromClauseNode>, rarg: impl Into<FromClauseNode>) -> Self {
        JoinExpr {
            larg: Box::new(larg.into()),
            rarg: Box::new(rarg.into()),
            alias: String::new(),
        }
    }

    /// Builder-style alias assignment.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(alias);
        self
    }

    pub fn larg(&self) -> &FromClauseNode {
        &self.larg
    }

    pub fn rarg(&self) -> &FromClauseNode {
        &self.rarg
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl SetAlias for JoinExpr {
    fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }
}

impl fmt::Display for JoinExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alias.is_empty() {
            write!(f, "{} JOIN {}", self.larg, self.rarg)
        } else {
            write!(f, "({} JOIN {}) AS {}", self.larg, self.rarg, self.alias)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_table() {
        let node: FromClauseNode = parse_ast("my_table").unwrap();
        assert_eq!(FromClauseNode::from(RangeVar::relation("my_table")), node);
    }

    #[test]
    fn schema_qualified_with_alias() {
        let node: FromClauseNode = parse_ast("public.users AS u").unwrap();
        let expected: FromClauseNode = RangeVar::new("public", "users").with_alias("u").into();
        assert_eq!(expected, node);
        assert_eq!("public.users AS u", node.to_string());
    }

    #[test]
    fn implicit_alias() {
        let node: FromClauseNode = parse_ast("users u").unwrap();
        assert_eq!("u", node.alias());
    }

    #[test]
    fn base_table_no_consume_where() {
        // Make sure we're not accidentally aliasing a table with a known keyword.
        let node: FromClauseNode = parse_ast("my_table WHERE a = 1").unwrap();
        assert_eq!("", node.alias());
    }

    #[test]
    fn alias_to_keyword_with_as() {
        let node: FromClauseNode = parse_ast("my_table AS order").unwrap();
        assert_eq!("order", node.alias());
    }

    #[test]
    fn alias_with_columns() {
        let node: FromClauseNode = parse_ast("my_table AS t1(c1, c2)").unwrap();
        let expected: FromClauseNode = RangeVar::relation("my_table").with_alias("t1").into();
        assert_eq!(expected, node);
    }

    #[test]
    fn inner_join_on() {
        let node: FromClauseNode = parse_ast("a JOIN b ON a.id = b.id").unwrap();
        let expected: FromClauseNode =
            JoinExpr::new(RangeVar::relation("a"), RangeVar::relation("b")).into();
        assert_eq!(expected, node);
    }

    #[test]
    fn join_variants() {
        for sql in [
            "a INNER JOIN b ON a.id = b.id",
            "a LEFT JOIN b USING (id)",
            "a LEFT OUTER JOIN b ON (a.id = b.id)",
            "a RIGHT JOIN b ON a.id = b.id",
            "a FULL OUTER JOIN b ON a.id = b.id",
            "a CROSS JOIN b",
            "a NATURAL JOIN b",
            "a NATURAL LEFT JOIN b",
        ] {
            let node: FromClauseNode = parse_ast(sql).unwrap();
            let expected: FromClauseNode =
                JoinExpr::new(RangeVar::relation("a"), RangeVar::relation("b")).into();
            assert_eq!(expected, node, "{sql}");
        }
    }

    #[test]
    fn nested_join_left_deep() {
        let node: FromClauseNode = parse_ast("t1 LEFT JOIN t2 ON x = y RIGHT JOIN t3 ON y = z").unwrap();
        let expected: FromClauseNode = JoinExpr::new(
            JoinExpr::new(RangeVar::relation("t1"), RangeVar::relation("t2")),
            RangeVar::relation("t3"),
        )
        .into();
        assert_eq!(expected, node);

        let names: Vec<_> = node
            .base_relations()
            .into_iter()
            .map(|r| r.relation_name())
            .collect();
        assert_eq!(vec!["t1", "t2", "t3"], names);
    }

    #[test]
    fn parenthesized_join_alias() {
        let node: FromClauseNode = parse_ast("(a AS x JOIN b ON x.id = b.id) AS j").unwrap();
        let expected: FromClauseNode = JoinExpr::new(
            RangeVar::relation("a").with_alias("x"),
            RangeVar::relation("b"),
        )
        .with_alias("j")
        .into();
        assert_eq!(expected, node);
        assert_eq!("(a AS x JOIN b) AS j", node.to_string());
    }

    #[test]
    fn join_missing_right_side() {
        assert!(parse_ast::<FromClauseNode>("a JOIN").is_err());
        assert!(parse_ast::<FromClauseNode>("a LEFT b").is_err());
    }

    #[test]
    fn subquery_unsupported() {
        assert!(parse_ast::<FromClauseNode>("(SELECT 1) AS s").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let depth = MAX_NESTING_DEPTH + 1;
        let sql = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        let err = parse_ast::<FromClauseNode>(&sql).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{err}");

        let sql = format!("a{}", " CROSS JOIN b".repeat(depth));
        let err = parse_ast::<FromClauseNode>(&sql).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{err}");

        let sql = format!("{}a{} CROSS JOIN b", "(".repeat(10), ")".repeat(10));
        let expected: FromClauseNode =
            JoinExpr::new(RangeVar::relation("a"), RangeVar::relation("b")).into();
        assert_eq!(expected, parse_ast::<FromClauseNode>(&sql).unwrap());
    }

    #[test]
    fn join_alias_does_not_propagate() {
        let mut join = JoinExpr::new(RangeVar::relation("t1"), RangeVar::relation("t2"));
        join.set_alias("j");

        assert_eq!("j", join.alias());
        assert_eq!("", join.larg().alias());
        assert_eq!("", join.rarg().alias());
    }

    #[test]
    fn alias_on_nested_join_only_touches_node() {
        let inner = JoinExpr::new(
            RangeVar::relation("a").with_alias("x"),
            RangeVar::relation("b"),
        )
        .with_alias("inner_j");
        let mut node: FromClauseNode = JoinExpr::new(inner.clone(), RangeVar::relation("c")).into();
        node.set_alias("outer_j");

        let FromClauseNode::JoinExpr(outer) = &node else {
            panic!("expected join");
        };
        assert_eq!("outer_j", outer.alias());
        assert_eq!(&FromClauseNode::JoinExpr(inner), outer.larg());
        assert_eq!("", outer.rarg().alias());
    }

    #[test]
    fn realias_replaces() {
        let mut rv = RangeVar::relation("t").with_alias("a");
        rv.set_alias("b");
        assert_eq!("b", rv.alias());
        assert_eq!("b", rv.visible_name());
    }
}
