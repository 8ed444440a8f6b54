use tracing::{debug, trace};

use crate::ast::{
    AExpr, AstParseable, Copy, CreateTable, Delete, Execute, Explain, Ident, Insert, ObjectReference,
    Prepare, Select, Update, VarSet,
};
use crate::errors::{ParseError, Result, unsupported};
use crate::keywords::Keyword;
use crate::statement::Statement;
use crate::tokens::{Token, TokenWithLocation, Tokenizer};

/// Parse a sql string into one or more statements.
///
/// Statements are separated by semicolons. An input with no statements in it
/// at all (empty, whitespace, comments, bare terminators) produces a single
/// `EmptyQuery`.
pub fn parse(sql: &str) -> Result<Vec<Statement>> {
    let mut parser = Parser::with_sql_string(sql)?;
    let statements = parser.parse_statements()?;
    debug!(count = statements.len(), "parsed sql string");
    Ok(statements)
}

/// Parse a sql string that must contain exactly one statement.
pub fn parse_one(sql: &str) -> Result<Statement> {
    let mut statements = parse(sql)?;
    if statements.len() != 1 {
        return Err(unsupported!(
            "expected exactly one statement, got {}",
            statements.len()
        ));
    }
    // Length checked above.
    Ok(statements.remove(0))
}

/// Maximum depth of parenthesized expressions, FROM items and nested
/// statements. Input past this returns an error instead of exhausting the
/// stack.
pub const MAX_NESTING_DEPTH: usize = 100;

#[derive(Debug)]
pub struct Parser {
    toks: Vec<TokenWithLocation>,
    /// Index of token we should process next.
    idx: usize,
    /// Current recursion depth, see `nested`.
    depth: usize,
}

impl Parser {
    pub fn with_sql_string(sql: &str) -> Result<Self> {
        let toks = Tokenizer::new(sql).tokenize()?;
        Ok(Parser::with_tokens(toks))
    }

    pub fn with_tokens(toks: Vec<TokenWithLocation>) -> Self {
        Parser {
            toks,
            idx: 0,
            depth: 0,
        }
    }

    pub fn parse_statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();

        loop {
            while self.consume_token(&Token::SemiColon) {}
            if self.peek().is_none() {
                break;
            }

            let statement = self.parse_statement()?;
            trace!(?statement, "parsed statement");
            statements.push(statement);

            match self.peek() {
                None => break,
                Some(tok) if tok.token == Token::SemiColon => continue,
                Some(_) => return Err(self.expected("end of statement")),
            }
        }

        if statements.is_empty() {
            statements.push(Statement::EmptyQuery);
        }

        Ok(statements)
    }

    /// Parse a single statement, stopping before the terminating semicolon
    /// (if any).
    pub fn parse_statement(&mut self) -> Result<Statement> {
        // EXPLAIN and PREPARE recurse back into here.
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Statement> {
        let tok = match self.peek() {
            Some(tok) => tok,
            None => return Ok(Statement::EmptyQuery),
        };

        let keyword = match &tok.token {
            Token::SemiColon => return Ok(Statement::EmptyQuery),
            Token::Word(w) => match w.keyword {
                Some(k) => k,
                None => return Err(self.expected("a SQL statement")),
            },
            Token::LeftParen => {
                // Parenthesized query, e.g. `(SELECT 1)`.
                self.next();
                let select = Select::parse(self)?;
                self.expect_token(&Token::RightParen)?;
                return Ok(Statement::Select(select));
            }
            _ => return Err(self.expected("a SQL statement")),
        };

        let statement = match keyword {
            Keyword::SELECT => Statement::Select(Select::parse(self)?),
            Keyword::INSERT => Statement::Insert(Insert::parse(self)?),
            Keyword::UPDATE => Statement::Update(Update::parse(self)?),
            Keyword::DELETE => Statement::Delete(Delete::parse(self)?),
            Keyword::COPY => Statement::Copy(Copy::parse(self)?),
            Keyword::EXPLAIN => Statement::Explain(Explain::parse(self)?),
            Keyword::PREPARE => Statement::Prepare(Prepare::parse(self)?),
            Keyword::EXECUTE => Statement::Execute(Execute::parse(self)?),
            Keyword::SET | Keyword::RESET => Statement::VarSet(VarSet::parse(self)?),
            Keyword::BEGIN | Keyword::START => {
                self.parse_begin()?;
                Statement::Begin
            }
            Keyword::COMMIT | Keyword::END => {
                self.next();
                self.skip_statement();
                Statement::Commit
            }
            Keyword::ROLLBACK | Keyword::ABORT => {
                self.next();
                self.skip_statement();
                Statement::Rollback
            }
            Keyword::CREATE => self.parse_create()?,
            Keyword::ALTER => self.parse_placeholder(Statement::Alter),
            Keyword::ANALYZE => self.parse_placeholder(Statement::Analyze),
            Keyword::CLUSTER => self.parse_placeholder(Statement::Cluster),
            Keyword::VACUUM => self.parse_placeholder(Statement::Vacuum),
            Keyword::TRUNCATE => self.parse_placeholder(Statement::Truncate),
            Keyword::DROP => self.parse_placeholder(Statement::Drop),
            other => return Err(unsupported!("statement starting with {other:?}")),
        };

        Ok(statement)
    }

    /// `BEGIN [WORK | TRANSACTION] [...]` or `START TRANSACTION [...]`
    fn parse_begin(&mut self) -> Result<()> {
        if self.parse_keyword(Keyword::START) {
            self.expect_keyword(Keyword::TRANSACTION)?;
        } else {
            self.expect_keyword(Keyword::BEGIN)?;
        }
        // Isolation level and access mode are not tracked.
        self.skip_statement();
        Ok(())
    }

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::CREATE)?;

        let statement = match self.peek().and_then(|t| t.keyword()) {
            Some(Keyword::TABLE | Keyword::TEMP | Keyword::TEMPORARY) => {
                Statement::CreateTable(CreateTable::parse(self)?)
            }
            Some(Keyword::INDEX | Keyword::UNIQUE) => Statement::Index,
            Some(Keyword::ROLE | Keyword::USER) => Statement::CreateRole,
            Some(Keyword::DATABASE) => Statement::CreateDatabase,
            Some(other) => return Err(unsupported!("CREATE {other:?}")),
            None => return Err(self.expected("object type after CREATE")),
        };

        self.skip_statement();
        Ok(statement)
    }

    fn parse_placeholder(&mut self, statement: Statement) -> Statement {
        self.next();
        self.skip_statement();
        statement
    }

    /// Parse an optional alias, returning None if the next token is a
    /// reserved keyword.
    ///
    /// An explicit `AS` allows any word to be used as the alias.
    pub fn parse_alias(&mut self, reserved: &[Keyword]) -> Result<Option<Ident>> {
        if self.parse_keyword(Keyword::AS) {
            return Ok(Some(Ident::parse(self)?));
        }

        let is_alias = match self.peek().map(|t| &t.token) {
            Some(Token::Word(w)) => !matches!(w.keyword, Some(kw) if reserved.contains(&kw)),
            _ => false,
        };

        if is_alias {
            Ok(Some(Ident::parse(self)?))
        } else {
            Ok(None)
        }
    }

    /// Parse a comma separated list of items, at least one item is required.
    pub fn parse_comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Parser) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut values = Vec::new();
        loop {
            values.push(f(self)?);
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        Ok(values)
    }

    pub fn parse_parenthesized_comma_separated<T>(
        &mut self,
        f: impl FnMut(&mut Parser) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.expect_token(&Token::LeftParen)?;
        let vals = self.parse_comma_separated(f)?;
        self.expect_token(&Token::RightParen)?;
        Ok(vals)
    }

    /// Parse an object reference and convert it to a (schema, relation)
    /// pair.
    pub fn parse_relation_name(&mut self) -> Result<(String, String)> {
        let reference = ObjectReference::parse(self)?;
        let mut idents = reference.0;
        match idents.len() {
            1 => Ok((String::new(), idents.remove(0).value)),
            2 => {
                let relation = idents.remove(1).value;
                Ok((idents.remove(0).value, relation))
            }
            n => Err(unsupported!(
                "relation names with {n} parts, only [schema.]relation is supported"
            )),
        }
    }

    /// Consume tokens up to the end of the current statement without
    /// interpreting them.
    ///
    /// Stops before a semicolon, the end of input, or a closing paren that
    /// doesn't match one opened while skipping. The last case allows skipping
    /// the tail of a parenthesized subquery.
    pub fn skip_statement(&mut self) {
        self.skip_until(|_| false);
    }

    /// Like `skip_statement`, but additionally stops before the first token
    /// at the current nesting depth for which `stop` returns true.
    pub fn skip_until(&mut self, stop: impl Fn(&TokenWithLocation) -> bool) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match &tok.token {
                Token::SemiColon if depth == 0 => return,
                Token::RightParen if depth == 0 => return,
                _ if depth == 0 && stop(tok) => return,
                Token::LeftParen => depth += 1,
                Token::RightParen => depth -= 1,
                _ => (),
            }
            self.next();
        }
    }

    /// Like `skip_until`, but errors if a parenthesized subquery appears
    /// anywhere in the skipped tokens. `clause` names what's being skipped
    /// for the error message.
    ///
    /// Used for clauses that are otherwise ignored, where a subquery could
    /// read relations that routing would never see.
    pub fn skip_until_no_subquery(
        &mut self,
        clause: &str,
        stop: impl Fn(&TokenWithLocation) -> bool,
    ) -> Result<()> {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match &tok.token {
                Token::SemiColon if depth == 0 => return Ok(()),
                Token::RightParen if depth == 0 => return Ok(()),
                _ if depth == 0 && stop(tok) => return Ok(()),
                Token::LeftParen => {
                    let opens_query = self.peek_nth(1).is_some_and(|t| {
                        t.is_keyword(Keyword::SELECT) || t.is_keyword(Keyword::WITH)
                    });
                    if opens_query {
                        return Err(unsupported!("subquery in {clause}"));
                    }
                    depth += 1;
                }
                Token::RightParen => depth -= 1,
                _ => (),
            }
            self.next();
        }
        Ok(())
    }

    /// Run `f` one nesting level deeper, failing once `MAX_NESTING_DEPTH` is
    /// exceeded.
    ///
    /// Every recursive descent in the grammar goes through here.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Parser) -> Result<T>) -> Result<T> {
        self.depth += 1;
        let result = if self.depth > MAX_NESTING_DEPTH {
            Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            })
        } else {
            f(self)
        };
        self.depth -= 1;
        result
    }

    /// Check if we're at the end of the current statement.
    ///
    /// A closing paren counts as the end when parsing a nested statement.
    pub fn at_statement_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(tok) => matches!(tok.token, Token::SemiColon | Token::RightParen),
        }
    }

    /// Parse a single keyword.
    pub fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        let idx = self.idx;
        if let Some(tok) = self.next() {
            if tok.is_keyword(keyword) {
                return true;
            }
        }

        // Keyword doesn't match. Reset index and return.
        self.idx = idx;
        false
    }

    /// Parse an exact sequence of keywords.
    ///
    /// If the sequence doesn't match, idx is not changed, and false is
    /// returned.
    pub fn parse_keyword_sequence(&mut self, keywords: &[Keyword]) -> bool {
        let idx = self.idx;
        for keyword in keywords {
            if let Some(tok) = self.next() {
                if tok.is_keyword(*keyword) {
                    continue;
                }
            }

            // Keyword doesn't match. Reset index and return.
            self.idx = idx;
            return false;
        }
        true
    }

    /// Parse any of the provided keywords, returning which keyword was
    /// parsed.
    pub fn parse_one_of_keywords(&mut self, keywords: &[Keyword]) -> Option<Keyword> {
        let idx = self.idx;
        let tok = self.next()?;

        let keyword = keywords.iter().find(|k| tok.is_keyword(**k)).copied();
        if keyword.is_none() {
            // No matches, reset index.
            self.idx = idx;
        }
        keyword
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.parse_keyword(keyword) {
            return Ok(());
        }
        Err(self.expected(&format!("{keyword:?}")))
    }

    /// Consume the next token if it matches the expected token.
    pub fn consume_token(&mut self, expected: &Token) -> bool {
        let idx = self.idx;
        if let Some(tok) = self.next() {
            if &tok.token == expected {
                return true;
            }
        }

        self.idx = idx;
        false
    }

    pub fn expect_token(&mut self, expected: &Token) -> Result<()> {
        if self.consume_token(expected) {
            return Ok(());
        }
        Err(self.expected(&format!("'{expected}'")))
    }

    /// Build an error describing what was expected and what the parser is
    /// currently looking at.
    pub fn expected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: tok.token.to_string(),
                line: tok.line,
                col: tok.col,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    /// Get the next non-whitespace token.
    pub fn next(&mut self) -> Option<&TokenWithLocation> {
        loop {
            if self.idx >= self.toks.len() {
                return None;
            }

            let tok = &self.toks[self.idx];
            self.idx += 1;

            if matches!(&tok.token, Token::Whitespace) {
                continue;
            }

            return Some(tok);
        }
    }

    /// Get the next non-whitespace token without consuming it.
    pub fn peek(&self) -> Option<&TokenWithLocation> {
        self.peek_nth(0)
    }

    /// Get the nth next non-whitespace token without consuming anything.
    pub fn peek_nth(&self, mut n: usize) -> Option<&TokenWithLocation> {
        let mut idx = self.idx;
        loop {
            let tok = self.toks.get(idx)?;
            idx += 1;
            if matches!(&tok.token, Token::Whitespace) {
                continue;
            }
            if n == 0 {
                return Some(tok);
            }
            n -= 1;
        }
    }
}

/// Parse a predicate, returning `AExpr::Empty` if no WHERE clause is present.
pub(crate) fn parse_optional_where(parser: &mut Parser) -> Result<AExpr> {
    if parser.parse_keyword(Keyword::WHERE) {
        AExpr::parse(parser)
    } else {
        Ok(AExpr::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_inputs() {
        for sql in ["", "   ", ";", " ; ;", "-- just a comment"] {
            assert_eq!(vec![Statement::EmptyQuery], parse(sql).unwrap(), "{sql:?}");
        }
    }

    #[test]
    fn multiple_statements() {
        let got = parse("begin; commit;").unwrap();
        assert_eq!(vec![Statement::Begin, Statement::Commit], got);
    }

    #[test]
    fn parse_one_rejects_many() {
        assert!(parse_one("begin; commit").is_err());
    }

    #[test]
    fn transaction_control() {
        let tests = [
            ("BEGIN", Statement::Begin),
            ("begin transaction isolation level serializable", Statement::Begin),
            ("START TRANSACTION READ ONLY", Statement::Begin),
            ("COMMIT", Statement::Commit),
            ("end work", Statement::Commit),
            ("ROLLBACK", Statement::Rollback),
            ("abort", Statement::Rollback),
        ];
        for (sql, expected) in tests {
            assert_eq!(expected, parse_one(sql).unwrap(), "{sql}");
        }
    }

    #[test]
    fn ddl_placeholders() {
        let tests = [
            ("ALTER TABLE t ADD COLUMN c int", Statement::Alter),
            ("ANALYZE t", Statement::Analyze),
            ("CLUSTER t USING idx", Statement::Cluster),
            ("VACUUM (FULL) t", Statement::Vacuum),
            ("TRUNCATE t1, t2", Statement::Truncate),
            ("DROP TABLE IF EXISTS t", Statement::Drop),
            ("CREATE INDEX idx ON t (a)", Statement::Index),
            ("CREATE UNIQUE INDEX idx ON t (a)", Statement::Index),
            ("CREATE ROLE app LOGIN", Statement::CreateRole),
            ("CREATE USER app", Statement::CreateRole),
            ("CREATE DATABASE shard_1", Statement::CreateDatabase),
        ];
        for (sql, expected) in tests {
            assert_eq!(expected, parse_one(sql).unwrap(), "{sql}");
        }
    }

    #[test]
    fn unknown_statement_is_error() {
        let err = parse("frobnicate the table").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }), "{err}");
    }

    #[test]
    fn trailing_garbage_is_error() {
        assert!(parse("commit;").is_ok());
        assert!(parse("select * from t where a = 1 b").is_err());
    }

    #[test]
    fn keyword_sequence_resets_on_mismatch() {
        let mut parser = Parser::with_sql_string("left outer join").unwrap();
        assert!(!parser.parse_keyword_sequence(&[Keyword::LEFT, Keyword::JOIN]));
        assert!(parser.parse_keyword_sequence(&[Keyword::LEFT, Keyword::OUTER, Keyword::JOIN]));
        assert!(parser.peek().is_none());
    }

    #[test]
    fn skip_until_no_subquery_rejects_nested_select() {
        let mut parser = Parser::with_sql_string("a, (b + 1), f((select c)) from t").unwrap();
        let err = parser
            .skip_until_no_subquery("projection", |t| t.is_keyword(Keyword::FROM))
            .unwrap_err();
        assert_eq!(unsupported!("subquery in projection"), err);

        let mut parser = Parser::with_sql_string("a, (b + 1), f(c) from t").unwrap();
        parser
            .skip_until_no_subquery("projection", |t| t.is_keyword(Keyword::FROM))
            .unwrap();
        assert!(parser.parse_keyword(Keyword::FROM));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let mut parser = Parser::with_sql_string("").unwrap();
        fn descend(parser: &mut Parser, levels: usize) -> Result<usize> {
            if levels == 0 {
                return Ok(parser.depth);
            }
            parser.nested(|parser| descend(parser, levels - 1))
        }

        assert_eq!(MAX_NESTING_DEPTH, descend(&mut parser, MAX_NESTING_DEPTH).unwrap());
        assert_eq!(
            ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH
            },
            descend(&mut parser, MAX_NESTING_DEPTH + 1).unwrap_err()
        );
        // Depth unwinds after an error.
        assert_eq!(0, parser.depth);
    }

    #[test]
    fn deeply_nested_statements_are_errors() {
        let sql = "EXPLAIN ".repeat(MAX_NESTING_DEPTH + 1) + "SELECT 1";
        let err = parse(&sql).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{err}");

        let sql = "EXPLAIN ".repeat(10) + "SELECT 1";
        assert!(parse(&sql).is_ok());
    }

    #[test]
    fn skip_until_respects_nesting() {
        let mut parser = Parser::with_sql_string("a (b where c) where d").unwrap();
        parser.skip_until(|t| t.is_keyword(Keyword::WHERE));
        assert!(parser.parse_keyword(Keyword::WHERE));
        assert_eq!(Some(Ident::from_string("d")), Ident::parse(&mut parser).ok());
    }
}
