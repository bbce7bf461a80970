//! Statement parser for the model-SQL surface.
//!
//! Statements such as `CREATE MODEL ... PREDICT ... USING ...` are not part of
//! any SQL dialect, so parsing is done over the token stream produced by
//! `sqlparser`'s tokenizer rather than its statement parser. Keywords are
//! matched case-insensitively; quoting and string escapes follow the tokenizer.

use crate::error::{ParseError, ParseErrorKind};
use crate::types::{
    Bindings, CreateModel, ModelQuery, ObjectName, OptionMap, OptionValue, Projection, Statement,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};

/// Parses a script of `;`-separated statements.
///
/// Empty statements and comments are skipped.
pub fn parse_statements(sql: &str) -> Result<Vec<Statement>, ParseError> {
    let dialect = GenericDialect {};
    let mut tokenizer = Tokenizer::new(&dialect, sql);
    let tokens: Vec<TokenWithSpan> = tokenizer
        .tokenize_with_location()?
        .into_iter()
        .filter(|token| !matches!(token.token, Token::Whitespace(_) | Token::EOF))
        .collect();

    tokens
        .split(|token| matches!(token.token, Token::SemiColon))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| StatementParser::new(chunk).parse_statement())
        .collect()
}

/// Parses exactly one statement. A trailing `;` is allowed.
pub fn parse_statement(sql: &str) -> Result<Statement, ParseError> {
    let mut statements = parse_statements(sql)?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(ParseError::new("Expected a statement, found empty input")
            .with_kind(ParseErrorKind::UnexpectedEof)),
        n => Err(ParseError::new(format!("Expected a single statement, found {n}"))),
    }
}

struct StatementParser<'a> {
    tokens: &'a [TokenWithSpan],
    pos: usize,
}

impl<'a> StatementParser<'a> {
    fn new(tokens: &'a [TokenWithSpan]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_statement(mut self) -> Result<Statement, ParseError> {
        let statement = if self.parse_keyword("CREATE") {
            self.parse_create()?
        } else if self.parse_keyword("DROP") {
            self.parse_drop()?
        } else if self.parse_keyword("SELECT") {
            Statement::Select(self.parse_select()?)
        } else if self.parse_keyword("DESCRIBE") || self.parse_keyword("DESC") {
            self.parse_one_of(&["MODEL", "PREDICTOR"]);
            Statement::Describe {
                name: self.parse_object_name()?,
            }
        } else if self.parse_keyword("SHOW") {
            self.parse_show()?
        } else {
            return Err(self.unsupported("Expected CREATE, DROP, SELECT, DESCRIBE or SHOW"));
        };

        self.expect_end()?;
        Ok(statement)
    }

    fn parse_create(&mut self) -> Result<Statement, ParseError> {
        let or_replace = self.parse_keywords(&["OR", "REPLACE"]);

        if self.parse_one_of(&["MODEL", "PREDICTOR"]) {
            return self.parse_create_model(or_replace);
        }

        if self.parse_one_of(&["DATABASE", "PROJECT", "SCHEMA"]) {
            if or_replace {
                return Err(self.unsupported("OR REPLACE is not supported for databases"));
            }
            let if_not_exists = self.parse_keywords(&["IF", "NOT", "EXISTS"]);
            let name = self.parse_identifier()?;
            return Ok(Statement::CreateProject {
                name,
                if_not_exists,
            });
        }

        Err(self.unsupported("Expected MODEL or DATABASE after CREATE"))
    }

    fn parse_create_model(&mut self, or_replace: bool) -> Result<Statement, ParseError> {
        let if_not_exists = self.parse_keywords(&["IF", "NOT", "EXISTS"]);
        let name = self.parse_object_name()?;

        if self.peek_keyword("FROM") {
            return Err(self.unsupported("Training data (FROM ...) is not supported"));
        }

        self.expect_keyword("PREDICT")?;
        let target = self.parse_column_name()?;

        let options = if self.parse_keyword("USING") {
            self.parse_option_list()?
        } else {
            OptionMap::new()
        };

        Ok(Statement::CreateModel(CreateModel {
            name,
            target,
            options,
            or_replace,
            if_not_exists,
        }))
    }

    fn parse_drop(&mut self) -> Result<Statement, ParseError> {
        if self.parse_one_of(&["MODEL", "PREDICTOR"]) {
            let if_exists = self.parse_keywords(&["IF", "EXISTS"]);
            return Ok(Statement::DropModel {
                name: self.parse_object_name()?,
                if_exists,
            });
        }

        if self.parse_one_of(&["DATABASE", "PROJECT", "SCHEMA"]) {
            let if_exists = self.parse_keywords(&["IF", "EXISTS"]);
            return Ok(Statement::DropProject {
                name: self.parse_identifier()?,
                if_exists,
            });
        }

        Err(self.unsupported("Expected MODEL or DATABASE after DROP"))
    }

    fn parse_show(&mut self) -> Result<Statement, ParseError> {
        if self.parse_one_of(&["MODELS", "PREDICTORS"]) {
            let project = if self.parse_one_of(&["FROM", "IN"]) {
                Some(self.parse_identifier()?)
            } else {
                None
            };
            return Ok(Statement::ShowModels { project });
        }

        if self.parse_one_of(&["DATABASES", "PROJECTS", "SCHEMAS"]) {
            return Ok(Statement::ShowDatabases);
        }

        Err(self.unsupported("Expected MODELS or DATABASES after SHOW"))
    }

    fn parse_select(&mut self) -> Result<ModelQuery, ParseError> {
        let projection = if self.consume(|t| matches!(t, Token::Mul)) {
            Projection::Wildcard
        } else {
            let mut columns = vec![self.parse_column_name()?];
            while self.consume(|t| matches!(t, Token::Comma)) {
                columns.push(self.parse_column_name()?);
            }
            Projection::Columns(columns)
        };

        self.expect_keyword("FROM")?;
        let model = self.parse_object_name()?;

        let mut bindings = Bindings::new();
        if self.parse_keyword("WHERE") {
            loop {
                let position = self.current_position();
                let column = self.parse_column_name()?;
                self.expect_token(|t| matches!(t, Token::Eq), "=")?;
                let value = self.parse_value()?;
                if bindings.insert(column.clone(), value).is_some() {
                    return Err(self.error_at(
                        format!("Duplicate condition on column '{column}'"),
                        position,
                    ));
                }
                if !self.parse_keyword("AND") {
                    break;
                }
            }
        }

        if self.peek_keyword("OR") {
            return Err(self.unsupported("Only equality conditions joined by AND are supported"));
        }

        Ok(ModelQuery {
            model,
            projection,
            bindings,
        })
    }

    fn parse_option_list(&mut self) -> Result<OptionMap, ParseError> {
        let mut options = OptionMap::new();
        loop {
            let position = self.current_position();
            let key = self.parse_identifier()?.to_ascii_lowercase();
            self.expect_token(|t| matches!(t, Token::Eq), "=")?;
            let value = self.parse_value()?;
            if options.insert(key.clone(), value).is_some() {
                return Err(self.error_at(format!("Duplicate USING option '{key}'"), position));
            }
            if !self.consume(|t| matches!(t, Token::Comma)) {
                break;
            }
        }
        Ok(options)
    }

    fn parse_value(&mut self) -> Result<OptionValue, ParseError> {
        let negative = self.consume(|t| matches!(t, Token::Minus));
        let Some(token) = self.next() else {
            return Err(self.eof_error("Expected a value"));
        };

        let value = match &token.token {
            Token::SingleQuotedString(s) if !negative => OptionValue::String(s.clone()),
            Token::Number(raw, _) => {
                let number: f64 = raw.parse().map_err(|_| {
                    self.error_at(format!("Invalid number '{raw}'"), Some(span_start(token)))
                })?;
                OptionValue::Number(if negative { -number } else { number })
            }
            Token::Word(word) if word.quote_style.is_none() && !negative => {
                match word.value.to_ascii_lowercase().as_str() {
                    "true" => OptionValue::Bool(true),
                    "false" => OptionValue::Bool(false),
                    "null" => OptionValue::Null,
                    _ => {
                        return Err(self.error_at(
                            format!("Expected a quoted string or number, found {}", word.value),
                            Some(span_start(token)),
                        ))
                    }
                }
            }
            other => {
                return Err(self.error_at(
                    format!("Expected a value, found {other}"),
                    Some(span_start(token)),
                ))
            }
        };
        Ok(value)
    }

    /// `project.name` or `name`.
    fn parse_object_name(&mut self) -> Result<ObjectName, ParseError> {
        let first = self.parse_identifier()?;
        if !self.consume(|t| matches!(t, Token::Period)) {
            return Ok(ObjectName::new(None, first));
        }
        let second = self.parse_identifier()?;
        if self.peek_is(|t| matches!(t, Token::Period)) {
            return Err(self.unsupported("Object names may have at most two parts"));
        }
        Ok(ObjectName::new(Some(&first), second))
    }

    /// A column reference; a table qualifier (`m.answer`) is dropped.
    fn parse_column_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.parse_identifier()?;
        while self.consume(|t| matches!(t, Token::Period)) {
            name = self.parse_identifier()?;
        }
        Ok(name)
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(TokenWithSpan {
                token: Token::Word(word),
                ..
            }) => {
                let value = word.value.clone();
                self.pos += 1;
                Ok(value)
            }
            Some(token) => Err(self.error_at(
                format!("Expected an identifier, found {}", token.token),
                Some(span_start(token)),
            )),
            None => Err(self.eof_error("Expected an identifier")),
        }
    }

    fn peek(&self) -> Option<&'a TokenWithSpan> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a TokenWithSpan> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_is(&self, predicate: impl Fn(&Token) -> bool) -> bool {
        self.peek().is_some_and(|t| predicate(&t.token))
    }

    fn consume(&mut self, predicate: impl Fn(&Token) -> bool) -> bool {
        if self.peek_is(predicate) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(
            self.tokens.get(self.pos + offset),
            Some(TokenWithSpan { token: Token::Word(word), .. })
                if word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword)
        )
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek_keyword_at(0, keyword)
    }

    fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the whole keyword sequence, or nothing.
    fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let all_match = keywords
            .iter()
            .enumerate()
            .all(|(offset, keyword)| self.peek_keyword_at(offset, keyword));
        if all_match {
            self.pos += keywords.len();
        }
        all_match
    }

    fn parse_one_of(&mut self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.parse_keyword(keyword))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.parse_keyword(keyword) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(self
                .error_at(
                    format!("Expected {keyword}, found {}", token.token),
                    Some(span_start(token)),
                )
                .with_kind(ParseErrorKind::MissingClause)),
            None => Err(self.eof_error(&format!("Expected {keyword}"))),
        }
    }

    fn expect_token(
        &mut self,
        predicate: impl Fn(&Token) -> bool,
        expected: &str,
    ) -> Result<(), ParseError> {
        if self.consume(predicate) {
            return Ok(());
        }
        match self.peek() {
            Some(token) => Err(self.error_at(
                format!("Expected {expected}, found {}", token.token),
                Some(span_start(token)),
            )),
            None => Err(self.eof_error(&format!("Expected {expected}"))),
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error_at(
                format!("Unexpected {} after end of statement", token.token),
                Some(span_start(token)),
            )),
        }
    }

    fn current_position(&self) -> Option<(u64, u64)> {
        self.peek().map(span_start)
    }

    fn error_at(&self, message: impl Into<String>, position: Option<(u64, u64)>) -> ParseError {
        match position {
            Some((line, column)) => {
                ParseError::with_position(message, line as usize, column as usize)
            }
            None => ParseError::new(message),
        }
    }

    fn eof_error(&self, message: &str) -> ParseError {
        let position = self
            .tokens
            .last()
            .map(|token| (token.span.end.line, token.span.end.column));
        self.error_at(format!("{message}, found end of statement"), position)
            .with_kind(ParseErrorKind::UnexpectedEof)
    }

    fn unsupported(&self, message: &str) -> ParseError {
        self.error_at(message, self.current_position())
            .with_kind(ParseErrorKind::UnsupportedFeature)
    }
}

fn span_start(token: &TokenWithSpan) -> (u64, u64) {
    (token.span.start.line, token.span.start.column)
}
